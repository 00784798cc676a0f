use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::shortcut::DEFAULT_SHORTCUT;

pub const DEFAULT_DELAY_MINUTES: f64 = 5.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("delay must be a number of minutes, 0 or greater (got {0})")]
    InvalidDelay(f64),
    #[error("shortcut cannot be empty")]
    EmptyShortcut,
}

/// The single global settings record; not scoped per origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveSettings {
    /// Minutes between shortcut presses; 0 disables the alarm.
    #[serde(default = "default_delay")]
    pub delay: f64,
    #[serde(default = "default_shortcut")]
    pub shortcut: String,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            delay: default_delay(),
            shortcut: default_shortcut(),
        }
    }
}

fn default_delay() -> f64 {
    DEFAULT_DELAY_MINUTES
}

fn default_shortcut() -> String {
    DEFAULT_SHORTCUT.to_string()
}

impl AutosaveSettings {
    pub fn new(delay: f64, shortcut: impl Into<String>) -> Self {
        Self {
            delay,
            shortcut: shortcut.into(),
        }
    }

    /// Repairs values loaded from storage that a user could not have saved.
    pub fn normalized(mut self) -> Self {
        if !is_valid_delay(self.delay) {
            warn!(delay = self.delay, "loaded delay is out of range; resetting to default");
            self.delay = default_delay();
        }

        let trimmed = self.shortcut.trim();
        if trimmed.is_empty() {
            warn!("loaded shortcut is empty; resetting to default");
            self.shortcut = default_shortcut();
        } else if trimmed.len() != self.shortcut.len() {
            self.shortcut = trimmed.to_string();
        }

        self
    }

    /// Checks a user-submitted update before it reaches the coordinator.
    pub fn validated(mut self) -> Result<Self, SettingsError> {
        if !is_valid_delay(self.delay) {
            return Err(SettingsError::InvalidDelay(self.delay));
        }

        let trimmed = self.shortcut.trim();
        if trimmed.is_empty() {
            return Err(SettingsError::EmptyShortcut);
        }
        self.shortcut = trimmed.to_string();

        Ok(self)
    }
}

fn is_valid_delay(delay: f64) -> bool {
    delay.is_finite() && delay >= 0.0
}
