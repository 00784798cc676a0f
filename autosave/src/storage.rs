//! Key/value persistence for settings and activated origins.
//!
//! The store mirrors an extension's synced storage area: `get` returns the
//! subset of requested keys that exist and `set` merges a record in. Nothing
//! here makes a read-then-write sequence atomic; callers that need that
//! serialize on their own (see [`crate::registry::ActivationRegistry`]).

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::settings::AutosaveSettings;

pub type Record = Map<String, Value>;

pub const DELAY_KEY: &str = "delay";
pub const SHORTCUT_KEY: &str = "shortcut";
pub const ACTIVATED_ORIGINS_KEY: &str = "activated_origins";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read store: {0}")]
    Read(String),
    #[error("failed to write store: {0}")]
    Write(String),
    #[error("stored value for `{key}` is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, keys: &[&str]) -> Result<Record, StorageError>;
    async fn set(&self, record: Record) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: Record) -> Self {
        Self {
            entries: Mutex::new(record),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Record, StorageError> {
        let entries = self.entries.lock().await;
        Ok(select_keys(&entries, keys))
    }

    async fn set(&self, record: Record) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        entries.extend(record);
        Ok(())
    }
}

/// A store persisted as one pretty-printed JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Record, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Record::new()),
            Err(err) => return Err(StorageError::Read(err.to_string())),
        };

        if content.trim().is_empty() {
            return Ok(Record::new());
        }

        serde_json::from_str::<Record>(&content).map_err(|err| StorageError::Read(err.to_string()))
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Record, StorageError> {
        let _guard = self.io_lock.lock().await;
        let entries = self.read_all().await?;
        Ok(select_keys(&entries, keys))
    }

    async fn set(&self, record: Record) -> Result<(), StorageError> {
        let _guard = self.io_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.extend(record);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Write(err.to_string()))?;
        }

        let serialized =
            serde_json::to_string_pretty(&entries).map_err(|err| StorageError::Write(err.to_string()))?;
        tokio::fs::write(&self.path, serialized)
            .await
            .map_err(|err| StorageError::Write(err.to_string()))?;
        debug!(path = %self.path.display(), "store written");
        Ok(())
    }
}

fn select_keys(entries: &Record, keys: &[&str]) -> Record {
    keys.iter()
        .filter_map(|key| {
            entries
                .get(*key)
                .map(|value| ((*key).to_string(), value.clone()))
        })
        .collect()
}

/// Reads the global settings, falling back to defaults when the store is
/// unreadable or holds values of the wrong type.
pub async fn load_settings(store: &dyn SettingsStore) -> AutosaveSettings {
    let record = match store.get(&[DELAY_KEY, SHORTCUT_KEY]).await {
        Ok(record) => record,
        Err(err) => {
            warn!("failed to read settings; using defaults: {err}");
            return AutosaveSettings::default();
        }
    };

    match serde_json::from_value::<AutosaveSettings>(Value::Object(record)) {
        Ok(settings) => settings.normalized(),
        Err(err) => {
            warn!("stored settings are malformed; using defaults: {err}");
            AutosaveSettings::default()
        }
    }
}

pub async fn save_settings(
    store: &dyn SettingsStore,
    settings: &AutosaveSettings,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(settings).map_err(|err| StorageError::Write(err.to_string()))?;
    match value {
        Value::Object(record) => store.set(record).await,
        _ => Err(StorageError::Write(
            "settings did not serialize to an object".to_string(),
        )),
    }
}

pub async fn load_origins(store: &dyn SettingsStore) -> Result<Vec<String>, StorageError> {
    let mut record = store.get(&[ACTIVATED_ORIGINS_KEY]).await?;
    match record.remove(ACTIVATED_ORIGINS_KEY) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value::<Vec<String>>(value).map_err(|err| StorageError::Malformed {
                key: ACTIVATED_ORIGINS_KEY.to_string(),
                reason: err.to_string(),
            })
        }
    }
}

pub async fn save_origins(
    store: &dyn SettingsStore,
    origins: &[String],
) -> Result<(), StorageError> {
    let mut record = Record::new();
    record.insert(
        ACTIVATED_ORIGINS_KEY.to_string(),
        Value::from(origins.to_vec()),
    );
    store.set(record).await
}
