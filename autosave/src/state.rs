use serde::Serialize;
use tokio::sync::Mutex;

use crate::metrics::CycleMetrics;
use crate::shortcut::ShortcutSpec;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ScheduleState {
    Disarmed,
    #[serde(rename_all = "camelCase")]
    Armed {
        period_minutes: f64,
        shortcut: ShortcutSpec,
    },
}

impl ScheduleState {
    pub fn is_armed(&self) -> bool {
        matches!(self, ScheduleState::Armed { .. })
    }

    pub fn shortcut(&self) -> Option<&ShortcutSpec> {
        match self {
            ScheduleState::Armed { shortcut, .. } => Some(shortcut),
            ScheduleState::Disarmed => None,
        }
    }
}

/// Mutable state owned by one coordinator. The parsed shortcut lives inside
/// the armed state so it is replaced together with the alarm.
pub struct RuntimeState {
    pub schedule: Mutex<ScheduleState>,
    pub metrics: Mutex<CycleMetrics>,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self {
            schedule: Mutex::new(ScheduleState::Disarmed),
            metrics: Mutex::new(CycleMetrics::new()),
        }
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}
