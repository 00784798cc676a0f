//! View logic for the settings page: form validation, the countdown to the
//! next autosave, the per-site status line and transient status messages.
//! Rendering is left to the host; everything here is plain data.

use serde::Serialize;
use thiserror::Error;

use crate::commands::{
    Request, Response, STATUS_ACTIVATED, STATUS_DEACTIVATED, STATUS_SETTINGS_UPDATED,
};
use crate::utils::format_mm_ss;

pub const STATUS_MESSAGE_TTL_MS: u64 = 3_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a valid number for delay (0 or greater).")]
    InvalidDelay,
    #[error("Please enter a keyboard shortcut.")]
    MissingShortcut,
}

/// Turns the raw form fields into an `updateSettings` request.
pub fn validate_form(delay_text: &str, shortcut_text: &str) -> Result<Request, FormError> {
    let delay = delay_text
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|delay| delay.is_finite() && *delay >= 0.0)
        .ok_or(FormError::InvalidDelay)?;

    let shortcut = shortcut_text.trim();
    if shortcut.is_empty() {
        return Err(FormError::MissingShortcut);
    }

    Ok(Request::UpdateSettings {
        delay,
        shortcut: shortcut.to_string(),
    })
}

/// Counts down to the next expected alarm, one frame per second.
///
/// The countdown is cosmetic; it restarts locally and never talks to the
/// alarm scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total_seconds: u64,
    remaining: Option<u64>,
}

impl Countdown {
    pub fn new(delay_minutes: f64) -> Self {
        let total_seconds = if delay_minutes.is_finite() && delay_minutes > 0.0 {
            (delay_minutes * 60.0).round() as u64
        } else {
            0
        };
        Self {
            total_seconds,
            remaining: Some(total_seconds),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.total_seconds == 0
    }

    /// Returns the text for the current second and advances by one.
    pub fn tick(&mut self) -> String {
        if self.is_disabled() {
            return "Autosave timer disabled (delay is 0)".to_string();
        }

        match self.remaining {
            Some(seconds) => {
                self.remaining = seconds.checked_sub(1);
                format!("Next autosave in: {}", format_mm_ss(seconds))
            }
            None => {
                self.remaining = Some(self.total_seconds);
                format!("Autosaving now... {}", format_mm_ss(0))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatusView {
    pub message: String,
    pub is_activated: bool,
    pub activate_enabled: bool,
    pub deactivate_enabled: bool,
}

impl SiteStatusView {
    /// `origin` is `None` for pages without an http(s) origin.
    pub fn describe(origin: Option<&str>, is_activated: bool) -> Self {
        match origin {
            None => Self {
                message: "Autosave cannot be managed for this page (e.g., chrome:// or file:// page)."
                    .to_string(),
                is_activated: false,
                activate_enabled: false,
                deactivate_enabled: false,
            },
            Some(origin) if is_activated => Self {
                message: format!("Autosave is ACTIVE for: {origin}"),
                is_activated: true,
                activate_enabled: false,
                deactivate_enabled: true,
            },
            Some(origin) => Self {
                message: format!("Autosave is INACTIVE for: {origin}"),
                is_activated: false,
                activate_enabled: true,
                deactivate_enabled: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub text: String,
    pub tone: Tone,
    pub ttl_ms: u64,
}

impl StatusMessage {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            ttl_ms: STATUS_MESSAGE_TTL_MS,
        }
    }

    pub fn from_form_error(err: &FormError) -> Self {
        Self::new(err.to_string(), Tone::Error)
    }

    /// Message shown after the background answered `request`; `None` for
    /// read-only requests.
    pub fn for_response(request: &Request, response: &Response) -> Option<Self> {
        let message = match request {
            Request::UpdateSettings { .. } => {
                if response.is_status(STATUS_SETTINGS_UPDATED) {
                    Self::new("Global settings saved and alarm updated!", Tone::Success)
                } else {
                    Self::new(
                        failure_text("Failed to save global settings.", response),
                        Tone::Error,
                    )
                }
            }
            Request::ActivateForOrigin { origin } => {
                if response.is_status(STATUS_ACTIVATED) {
                    Self::new(format!("Autosave activated for {origin}!"), Tone::Success)
                } else {
                    Self::new(failure_text("Failed to activate autosave.", response), Tone::Error)
                }
            }
            Request::DeactivateForOrigin { origin } => {
                if response.is_status(STATUS_DEACTIVATED) {
                    Self::new(format!("Autosave deactivated for {origin}!"), Tone::Notice)
                } else {
                    Self::new(
                        failure_text("Failed to deactivate autosave.", response),
                        Tone::Error,
                    )
                }
            }
            Request::GetSettings | Request::GetActivationStatus { .. } => return None,
        };
        Some(message)
    }
}

fn failure_text(summary: &str, response: &Response) -> String {
    match response {
        Response::Status {
            message: Some(detail),
            ..
        } => format!("{summary} {detail}"),
        _ => summary.to_string(),
    }
}
