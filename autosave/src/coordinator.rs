use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::host::{
    AlarmFired, AlarmScheduler, AlarmSpec, ForegroundQuery, HostError, PageInjector,
};
use crate::metrics::{CycleOutcome, CycleReport};
use crate::origin::origin_from_url;
use crate::registry::ActivationRegistry;
use crate::shortcut::{ParseError, parse_shortcut};
use crate::state::{RuntimeState, ScheduleState};
use crate::storage::{SettingsStore, load_settings};

pub const ALARM_NAME: &str = "shortcutAlarm";

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid shortcut: {0}")]
    Parse(#[from] ParseError),
    #[error("failed to arm alarm: {0}")]
    Host(#[from] HostError),
}

pub struct ScheduleCoordinator {
    store: Arc<dyn SettingsStore>,
    registry: ActivationRegistry,
    alarms: Arc<dyn AlarmScheduler>,
    foreground: Arc<dyn ForegroundQuery>,
    injector: Arc<dyn PageInjector>,
    runtime: RuntimeState,
    settings_gate: Mutex<()>,
}

impl ScheduleCoordinator {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        alarms: Arc<dyn AlarmScheduler>,
        foreground: Arc<dyn ForegroundQuery>,
        injector: Arc<dyn PageInjector>,
    ) -> Self {
        Self {
            registry: ActivationRegistry::new(Arc::clone(&store)),
            store,
            alarms,
            foreground,
            injector,
            runtime: RuntimeState::new(),
            settings_gate: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &ActivationRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub async fn state(&self) -> ScheduleState {
        self.runtime.schedule.lock().await.clone()
    }

    pub async fn cycle_report(&self) -> CycleReport {
        self.runtime.metrics.lock().await.report()
    }

    /// Held while settings are applied and persisted, so the armed schedule
    /// and the stored settings come from the same update.
    pub async fn lock_settings(&self) -> MutexGuard<'_, ()> {
        self.settings_gate.lock().await
    }

    /// Loads persisted settings (or defaults) and arms accordingly.
    pub async fn initialize(&self) -> ScheduleState {
        let _gate = self.lock_settings().await;
        let settings = load_settings(self.store.as_ref()).await;
        info!(
            delay = settings.delay,
            shortcut = settings.shortcut.as_str(),
            "loaded settings"
        );

        match self.configure(settings.delay, &settings.shortcut).await {
            Ok(state) => state,
            Err(err) => {
                warn!("stored settings could not arm the alarm: {err}");
                ScheduleState::Disarmed
            }
        }
    }

    /// Replaces the current schedule. The previous alarm is always cancelled
    /// before a new one is created, so at most one alarm exists.
    pub async fn configure(
        &self,
        delay_minutes: f64,
        shortcut: &str,
    ) -> Result<ScheduleState, CoordinatorError> {
        let mut schedule = self.runtime.schedule.lock().await;

        let spec = match parse_shortcut(shortcut) {
            Ok(spec) => spec,
            Err(err) => {
                self.disarm(&mut schedule).await;
                info!("alarm cleared due to invalid shortcut: {err}");
                return Err(err.into());
            }
        };

        if !(delay_minutes.is_finite() && delay_minutes > 0.0) {
            self.disarm(&mut schedule).await;
            info!(delay_minutes, "delay is 0 or less; alarm not scheduled");
            return Ok(ScheduleState::Disarmed);
        }

        self.cancel_alarm().await;
        if let Err(err) = self
            .alarms
            .schedule(ALARM_NAME, AlarmSpec::repeating(delay_minutes))
            .await
        {
            *schedule = ScheduleState::Disarmed;
            return Err(err.into());
        }

        info!(
            delay_minutes,
            shortcut = %spec,
            "alarm scheduled, repeating"
        );
        *schedule = ScheduleState::Armed {
            period_minutes: delay_minutes,
            shortcut: spec,
        };
        Ok(schedule.clone())
    }

    pub async fn handle_alarm(&self, fired: &AlarmFired) -> CycleOutcome {
        let outcome = self.run_cycle(fired).await;
        let mut metrics = self.runtime.metrics.lock().await;
        metrics.record(outcome);
        outcome
    }

    async fn run_cycle(&self, fired: &AlarmFired) -> CycleOutcome {
        if fired.name != ALARM_NAME {
            debug!(name = fired.name.as_str(), "ignoring unrelated alarm");
            return CycleOutcome::Ignored;
        }

        let shortcut = {
            let schedule = self.runtime.schedule.lock().await;
            match schedule.shortcut() {
                Some(shortcut) => shortcut.clone(),
                None => {
                    warn!("alarm fired while disarmed; no shortcut to press");
                    return CycleOutcome::NotArmed;
                }
            }
        };

        let Some(context) = self.foreground.active_context().await else {
            warn!("no active tab found");
            return CycleOutcome::NoForeground;
        };

        let Some(origin) = origin_from_url(&context.url) else {
            warn!(url = context.url.as_str(), "could not get origin for active tab");
            return CycleOutcome::UnresolvableOrigin;
        };

        match self.registry.is_active(&origin).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(origin = origin.as_str(), "autosave not active; shortcut not pressed");
                return CycleOutcome::Inactive;
            }
            Err(err) => {
                warn!(origin = origin.as_str(), "failed to read activated origins: {err}");
                return CycleOutcome::Inactive;
            }
        }

        match self.injector.inject(context.tab_id, &shortcut).await {
            Ok(()) => {
                info!(
                    origin = origin.as_str(),
                    tab_id = context.tab_id,
                    shortcut = %shortcut,
                    "shortcut simulation injected"
                );
                CycleOutcome::Synthesized
            }
            Err(err) => {
                warn!(
                    origin = origin.as_str(),
                    tab_id = context.tab_id,
                    "failed to inject shortcut simulation: {err}"
                );
                CycleOutcome::InjectionFailed
            }
        }
    }

    async fn disarm(&self, schedule: &mut ScheduleState) {
        self.cancel_alarm().await;
        *schedule = ScheduleState::Disarmed;
    }

    async fn cancel_alarm(&self) {
        match self.alarms.cancel(ALARM_NAME).await {
            Ok(true) => debug!("previous alarm cancelled"),
            Ok(false) => {}
            Err(err) => warn!("failed to cancel previous alarm: {err}"),
        }
    }
}
