use std::path::PathBuf;

use tracing::warn;

pub const STORE_PATH_ENV: &str = "AUTOSAVE_STORE_PATH";
pub const LOG_FILTER_ENV: &str = "AUTOSAVE_LOG";
const DEFAULT_LOG_FILTER: &str = "info";
const STORE_DIR_NAME: &str = "autosave";
const STORE_FILE_NAME: &str = "storage.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundConfig {
    /// JSON file holding settings and activated origins.
    pub store_path: PathBuf,
    pub log_filter: String,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BackgroundConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = non_blank(lookup(STORE_PATH_ENV)) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(filter) = non_blank(lookup(LOG_FILTER_ENV)) {
            config.log_filter = filter;
        }

        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_store_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(STORE_DIR_NAME).join(STORE_FILE_NAME),
        None => {
            warn!("no platform config directory; storing settings in the working directory");
            PathBuf::from(STORE_FILE_NAME)
        }
    }
}
