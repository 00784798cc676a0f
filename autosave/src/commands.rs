use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::coordinator::{CoordinatorError, ScheduleCoordinator};
use crate::settings::{AutosaveSettings, SettingsError};
use crate::state::ScheduleState;
use crate::storage::{StorageError, load_settings, save_settings};

pub const STATUS_SETTINGS_UPDATED: &str = "settings updated";
pub const STATUS_ACTIVATED: &str = "activated";
pub const STATUS_DEACTIVATED: &str = "deactivated";
pub const STATUS_ERROR: &str = "error";

/// Messages the settings page sends to the background coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    UpdateSettings { delay: f64, shortcut: String },
    GetSettings,
    GetActivationStatus { origin: String },
    ActivateForOrigin { origin: String },
    DeactivateForOrigin { origin: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    Activation { is_activated: bool },
    Status {
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Settings(AutosaveSettings),
}

impl Response {
    pub fn status(status: &str) -> Self {
        Response::Status {
            status: status.to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Status {
            status: STATUS_ERROR.to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_status(&self, expected: &str) -> bool {
        matches!(self, Response::Status { status, .. } if status == expected)
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error("failed to save: {0}")]
    Storage(#[from] StorageError),
    #[error("origin is required")]
    MissingOrigin,
    #[error("malformed request: {0}")]
    Malformed(String),
}

pub async fn handle_request(coordinator: &ScheduleCoordinator, request: Request) -> Response {
    let result = match request {
        Request::UpdateSettings { delay, shortcut } => {
            update_settings(coordinator, AutosaveSettings::new(delay, shortcut))
                .await
                .map(|_| Response::status(STATUS_SETTINGS_UPDATED))
        }
        Request::GetSettings => Ok(Response::Settings(
            load_settings(coordinator.store()).await,
        )),
        Request::GetActivationStatus { origin } => {
            Ok(get_activation_status(coordinator, &origin).await)
        }
        Request::ActivateForOrigin { origin } => activate_for_origin(coordinator, &origin)
            .await
            .map(|()| Response::status(STATUS_ACTIVATED)),
        Request::DeactivateForOrigin { origin } => deactivate_for_origin(coordinator, &origin)
            .await
            .map(|()| Response::status(STATUS_DEACTIVATED)),
    };

    result.unwrap_or_else(|err| {
        warn!("request failed: {err}");
        Response::error(err.to_string())
    })
}

/// Entry point for hosts that pass messages through as JSON text.
pub async fn handle_json(coordinator: &ScheduleCoordinator, message: &str) -> String {
    let response = match serde_json::from_str::<Request>(message) {
        Ok(request) => handle_request(coordinator, request).await,
        Err(err) => Response::error(CommandError::Malformed(err.to_string()).to_string()),
    };

    serde_json::to_string(&response).unwrap_or_else(|err| {
        format!(r#"{{"status":"{STATUS_ERROR}","message":"failed to encode response: {err}"}}"#)
    })
}

/// Applies new settings to the coordinator, then persists them. Concurrent
/// updates run one after another.
///
/// A shortcut that does not parse disarms the alarm and is not saved.
pub async fn update_settings(
    coordinator: &ScheduleCoordinator,
    settings: AutosaveSettings,
) -> Result<ScheduleState, CommandError> {
    let validated = settings.validated()?;
    let _gate = coordinator.lock_settings().await;
    let state = coordinator
        .configure(validated.delay, &validated.shortcut)
        .await?;

    save_settings(coordinator.store(), &validated).await?;
    info!(
        delay = validated.delay,
        shortcut = validated.shortcut.as_str(),
        "settings saved"
    );
    Ok(state)
}

async fn get_activation_status(coordinator: &ScheduleCoordinator, origin: &str) -> Response {
    let is_activated = match coordinator.registry().is_active(origin).await {
        Ok(active) => active,
        Err(err) => {
            warn!(origin, "failed to read activated origins; reporting inactive: {err}");
            false
        }
    };
    Response::Activation { is_activated }
}

async fn activate_for_origin(
    coordinator: &ScheduleCoordinator,
    origin: &str,
) -> Result<(), CommandError> {
    let origin = require_origin(origin)?;
    coordinator.registry().activate(origin).await?;
    Ok(())
}

async fn deactivate_for_origin(
    coordinator: &ScheduleCoordinator,
    origin: &str,
) -> Result<(), CommandError> {
    let origin = require_origin(origin)?;
    coordinator.registry().deactivate(origin).await?;
    Ok(())
}

fn require_origin(origin: &str) -> Result<&str, CommandError> {
    let trimmed = origin.trim();
    if trimmed.is_empty() {
        return Err(CommandError::MissingOrigin);
    }
    Ok(trimmed)
}
