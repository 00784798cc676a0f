//! Interfaces to the host platform: alarms, the foreground tab and page
//! injection. The coordinator only talks to these traits.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::shortcut::ShortcutSpec;

pub const ALARM_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("alarm period must be a positive number of minutes (got {0})")]
    InvalidPeriod(String),
    #[error("alarm scheduler is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectionError {
    #[error("script injection was refused: {0}")]
    Refused(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSpec {
    pub delay_minutes: f64,
    pub period_minutes: f64,
}

impl AlarmSpec {
    pub fn repeating(minutes: f64) -> Self {
        Self {
            delay_minutes: minutes,
            period_minutes: minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmFired {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundContext {
    pub tab_id: u64,
    pub url: String,
}

#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    /// Creates a repeating alarm, replacing any alarm with the same name.
    async fn schedule(&self, name: &str, alarm: AlarmSpec) -> Result<(), HostError>;

    /// Returns whether an alarm with this name existed.
    async fn cancel(&self, name: &str) -> Result<bool, HostError>;
}

#[async_trait]
pub trait ForegroundQuery: Send + Sync {
    async fn active_context(&self) -> Option<ForegroundContext>;
}

#[async_trait]
pub trait PageInjector: Send + Sync {
    /// Runs the key event synthesizer inside the given tab.
    async fn inject(&self, tab_id: u64, spec: &ShortcutSpec) -> Result<(), InjectionError>;
}

/// Alarm scheduler backed by tokio timers; fires are delivered on the
/// receiver returned from [`TokioAlarms::new`].
pub struct TokioAlarms {
    fired_tx: mpsc::Sender<AlarmFired>,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioAlarms {
    pub fn new() -> (Self, mpsc::Receiver<AlarmFired>) {
        let (fired_tx, fired_rx) = mpsc::channel(ALARM_CHANNEL_CAPACITY);
        let alarms = Self {
            fired_tx,
            tasks: Mutex::new(HashMap::new()),
        };
        (alarms, fired_rx)
    }

    pub async fn active_count(&self) -> usize {
        let tasks = self.tasks.lock().await;
        tasks.values().filter(|task| !task.is_finished()).count()
    }
}

#[async_trait]
impl AlarmScheduler for TokioAlarms {
    async fn schedule(&self, name: &str, alarm: AlarmSpec) -> Result<(), HostError> {
        let delay = minutes_to_duration(alarm.delay_minutes, true)?;
        let period = minutes_to_duration(alarm.period_minutes, false)?;

        let fired_tx = self.fired_tx.clone();
        let alarm_name = name.to_string();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let fired = AlarmFired {
                    name: alarm_name.clone(),
                };
                if fired_tx.send(fired).await.is_err() {
                    debug!(name = alarm_name.as_str(), "alarm receiver dropped; stopping alarm");
                    break;
                }
            }
        });

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.insert(name.to_string(), task) {
            previous.abort();
        }
        Ok(())
    }

    async fn cancel(&self, name: &str) -> Result<bool, HostError> {
        let mut tasks = self.tasks.lock().await;
        match tasks.remove(name) {
            Some(task) => {
                task.abort();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for TokioAlarms {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().values() {
            task.abort();
        }
    }
}

fn minutes_to_duration(minutes: f64, allow_zero: bool) -> Result<Duration, HostError> {
    let valid = minutes.is_finite() && (minutes > 0.0 || (allow_zero && minutes == 0.0));
    if !valid {
        return Err(HostError::InvalidPeriod(minutes.to_string()));
    }
    Duration::try_from_secs_f64(minutes * 60.0)
        .map_err(|_| HostError::InvalidPeriod(minutes.to_string()))
}
