use serde::Serialize;

use crate::utils::now_epoch_ms;

const INJECTION_FAILURE_WARN_STREAK: u64 = 3;

/// What a single alarm fire ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CycleOutcome {
    /// The alarm belongs to someone else.
    Ignored,
    /// A late fire arrived after the coordinator was disarmed.
    NotArmed,
    NoForeground,
    UnresolvableOrigin,
    Inactive,
    Synthesized,
    InjectionFailed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub generated_at_ms: u64,
    pub alarms_fired: u64,
    pub shortcuts_sent: u64,
    pub skipped_not_armed: u64,
    pub skipped_no_foreground: u64,
    pub skipped_unresolvable_origin: u64,
    pub skipped_inactive: u64,
    pub injection_failures: u64,
    pub last_sent_at_ms: Option<u64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CycleMetrics {
    alarms_fired: u64,
    shortcuts_sent: u64,
    skipped_not_armed: u64,
    skipped_no_foreground: u64,
    skipped_unresolvable_origin: u64,
    skipped_inactive: u64,
    injection_failures: u64,
    injection_failure_streak: u64,
    last_sent_at_ms: Option<u64>,
}

impl CycleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: CycleOutcome) {
        if outcome == CycleOutcome::Ignored {
            return;
        }

        self.alarms_fired += 1;
        match outcome {
            CycleOutcome::Ignored => {}
            CycleOutcome::NotArmed => self.skipped_not_armed += 1,
            CycleOutcome::NoForeground => self.skipped_no_foreground += 1,
            CycleOutcome::UnresolvableOrigin => self.skipped_unresolvable_origin += 1,
            CycleOutcome::Inactive => self.skipped_inactive += 1,
            CycleOutcome::Synthesized => {
                self.shortcuts_sent += 1;
                self.injection_failure_streak = 0;
                self.last_sent_at_ms = Some(now_epoch_ms());
            }
            CycleOutcome::InjectionFailed => {
                self.injection_failures += 1;
                self.injection_failure_streak += 1;
            }
        }
    }

    pub fn report(&self) -> CycleReport {
        let mut warnings = Vec::new();
        if self.injection_failure_streak >= INJECTION_FAILURE_WARN_STREAK {
            warnings.push(format!(
                "The last {} shortcut injections failed; the page may block scripted input.",
                self.injection_failure_streak
            ));
        }
        if self.alarms_fired > 0 && self.skipped_unresolvable_origin == self.alarms_fired {
            warnings.push(
                "Every alarm so far landed on a page that cannot be managed.".to_string(),
            );
        }

        CycleReport {
            generated_at_ms: now_epoch_ms(),
            alarms_fired: self.alarms_fired,
            shortcuts_sent: self.shortcuts_sent,
            skipped_not_armed: self.skipped_not_armed,
            skipped_no_foreground: self.skipped_no_foreground,
            skipped_unresolvable_origin: self.skipped_unresolvable_origin,
            skipped_inactive: self.skipped_inactive,
            injection_failures: self.injection_failures,
            last_sent_at_ms: self.last_sent_at_ms,
            warnings,
        }
    }
}
