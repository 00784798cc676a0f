pub mod commands;
pub mod config;
pub mod coordinator;
mod error;
pub mod host;
pub mod input;
pub mod metrics;
pub mod origin;
pub mod registry;
pub mod settings;
pub mod shortcut;
pub mod state;
pub mod storage;
#[cfg(test)]
mod testing;
pub mod ui;
mod utils;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use commands::{Request, Response};
pub use config::BackgroundConfig;
pub use coordinator::{ALARM_NAME, ScheduleCoordinator};
pub use error::AppError;
pub use shortcut::{ParseError, ShortcutSpec, parse_shortcut};

use host::{AlarmFired, AlarmScheduler, ForegroundQuery, PageInjector, TokioAlarms};
use storage::{JsonFileStore, SettingsStore};

pub fn init_logging(filter: &str) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| AppError::LoggingInit(err.to_string()))
}

/// A running background coordinator and the task feeding it alarm fires.
pub struct Background {
    coordinator: Arc<ScheduleCoordinator>,
    alarms: Arc<TokioAlarms>,
    dispatcher: JoinHandle<()>,
}

impl Background {
    pub fn coordinator(&self) -> &ScheduleCoordinator {
        &self.coordinator
    }

    pub async fn handle_request(&self, request: Request) -> Response {
        commands::handle_request(&self.coordinator, request).await
    }

    pub async fn handle_json(&self, message: &str) -> String {
        commands::handle_json(&self.coordinator, message).await
    }

    /// Cancels the alarm and stops the dispatcher. Persisted settings are
    /// left alone so the next start re-arms.
    pub async fn shutdown(self) -> Result<(), AppError> {
        if let Err(err) = self.alarms.cancel(ALARM_NAME).await {
            warn!("failed to cancel alarm during shutdown: {err}");
        }

        self.dispatcher.abort();
        match self.dispatcher.await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => return Err(AppError::Runtime(err.to_string())),
        }

        info!("background coordinator stopped");
        Ok(())
    }
}

/// Starts the coordinator with settings persisted at `config.store_path`,
/// logging with `config.log_filter`.
pub async fn start(
    config: &BackgroundConfig,
    foreground: Arc<dyn ForegroundQuery>,
    injector: Arc<dyn PageInjector>,
) -> Background {
    if let Err(init_err) = init_logging(&config.log_filter) {
        eprintln!("logging bootstrap failed: {init_err}");
    }

    info!(store = %config.store_path.display(), "starting autosave background");
    let store = Arc::new(JsonFileStore::new(config.store_path.clone()));
    start_with_store(store, foreground, injector).await
}

pub async fn start_with_store(
    store: Arc<dyn SettingsStore>,
    foreground: Arc<dyn ForegroundQuery>,
    injector: Arc<dyn PageInjector>,
) -> Background {
    let (alarms, fired_rx) = TokioAlarms::new();
    let alarms = Arc::new(alarms);
    let coordinator = Arc::new(ScheduleCoordinator::new(
        store,
        alarms.clone(),
        foreground,
        injector,
    ));

    let dispatcher = spawn_alarm_dispatcher(Arc::clone(&coordinator), fired_rx);
    let state = coordinator.initialize().await;
    info!(armed = state.is_armed(), "background initialized");

    Background {
        coordinator,
        alarms,
        dispatcher,
    }
}

fn spawn_alarm_dispatcher(
    coordinator: Arc<ScheduleCoordinator>,
    mut fired_rx: mpsc::Receiver<AlarmFired>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(fired) = fired_rx.recv().await {
            let outcome = coordinator.handle_alarm(&fired).await;
            debug!(name = fired.name.as_str(), ?outcome, "alarm handled");
        }
        warn!("alarm channel closed");
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::commands::{STATUS_ACTIVATED, STATUS_SETTINGS_UPDATED};
    use crate::storage::MemoryStore;
    use crate::testing::{FakeForeground, RecordingInjector};

    #[tokio::test(start_paused = true)]
    async fn armed_background_presses_shortcut_on_active_site() {
        let foreground = Arc::new(FakeForeground::new());
        let injector = Arc::new(RecordingInjector::new());
        let background = start_with_store(
            Arc::new(MemoryStore::new()),
            foreground.clone(),
            injector.clone(),
        )
        .await;
        assert!(background.coordinator().state().await.is_armed());

        let reply = background
            .handle_request(Request::UpdateSettings {
                delay: 1.0,
                shortcut: "Ctrl+S".to_string(),
            })
            .await;
        assert!(reply.is_status(STATUS_SETTINGS_UPDATED));
        let reply = background
            .handle_json(r#"{"action":"activateForOrigin","origin":"https://docs.example.com"}"#)
            .await;
        assert!(reply.contains(STATUS_ACTIVATED));
        foreground.set(4, "https://docs.example.com/d/1");

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(injector.injected().len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(injector.injected().len(), 2);
        assert_eq!(background.coordinator().cycle_report().await.shortcuts_sent, 2);

        background.shutdown().await.expect("shutdown should succeed");
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_background_never_fires() {
        let injector = Arc::new(RecordingInjector::new());
        let background = start_with_store(
            Arc::new(MemoryStore::new()),
            Arc::new(FakeForeground::new()),
            injector.clone(),
        )
        .await;

        background
            .handle_request(Request::UpdateSettings {
                delay: 0.0,
                shortcut: "Ctrl+S".to_string(),
            })
            .await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert!(injector.injected().is_empty());
        assert_eq!(background.coordinator().cycle_report().await.alarms_fired, 0);
        background.shutdown().await.expect("shutdown should succeed");
    }

    #[test]
    fn second_logging_bootstrap_is_reported() {
        let _ = init_logging("info");
        assert!(matches!(
            init_logging("debug"),
            Err(AppError::LoggingInit(_))
        ));
    }

    #[tokio::test]
    async fn start_reads_settings_from_json_file() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let config = BackgroundConfig {
            store_path: dir.path().join("storage.json"),
            log_filter: "info".to_string(),
        };
        std::fs::write(&config.store_path, r#"{"delay": 0, "shortcut": "Alt+S"}"#)
            .expect("fixture should be written");

        let background = start(
            &config,
            Arc::new(FakeForeground::new()),
            Arc::new(RecordingInjector::new()),
        )
        .await;

        assert!(!background.coordinator().state().await.is_armed());
        let reply = background.handle_json(r#"{"action":"getSettings"}"#).await;
        assert!(reply.contains("Alt+S"));
        background.shutdown().await.expect("shutdown should succeed");
    }
}
