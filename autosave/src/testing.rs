//! In-process stand-ins for the host collaborators, shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::host::{
    AlarmScheduler, AlarmSpec, ForegroundContext, ForegroundQuery, HostError, InjectionError,
    PageInjector,
};
use crate::input::{KeyboardEvent, synthesize};
use crate::shortcut::ShortcutSpec;
use crate::storage::{MemoryStore, Record, SettingsStore, StorageError};

/// A memory store whose reads or writes can be made to fail, and whose first
/// write can be made to stall.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    stall_first_write: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stall_first_write(&self) {
        self.stall_first_write.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for FaultyStore {
    async fn get(&self, keys: &[&str]) -> Result<Record, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Read("storage area unavailable".to_string()));
        }
        self.inner.get(keys).await
    }

    async fn set(&self, record: Record) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write("quota exceeded".to_string()));
        }
        if self.stall_first_write.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.inner.set(record).await
    }
}

#[derive(Default)]
struct AlarmTable {
    active: Vec<(String, AlarmSpec)>,
    max_concurrent: usize,
    fail_next: bool,
}

/// Records alarms instead of running timers.
#[derive(Default)]
pub struct FakeAlarms {
    table: Mutex<AlarmTable>,
}

impl FakeAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Vec<(String, AlarmSpec)> {
        self.table.lock().expect("alarm table lock").active.clone()
    }

    pub fn max_concurrent(&self) -> usize {
        self.table.lock().expect("alarm table lock").max_concurrent
    }

    pub fn fail_next_schedule(&self) {
        self.table.lock().expect("alarm table lock").fail_next = true;
    }
}

#[async_trait]
impl AlarmScheduler for FakeAlarms {
    async fn schedule(&self, name: &str, alarm: AlarmSpec) -> Result<(), HostError> {
        let mut table = self.table.lock().expect("alarm table lock");
        if std::mem::take(&mut table.fail_next) {
            return Err(HostError::Unavailable("fake scheduler offline".to_string()));
        }
        table.active.retain(|(existing, _)| existing != name);
        table.active.push((name.to_string(), alarm));
        table.max_concurrent = table.max_concurrent.max(table.active.len());
        Ok(())
    }

    async fn cancel(&self, name: &str) -> Result<bool, HostError> {
        let mut table = self.table.lock().expect("alarm table lock");
        let before = table.active.len();
        table.active.retain(|(existing, _)| existing != name);
        Ok(table.active.len() != before)
    }
}

#[derive(Default)]
pub struct FakeForeground {
    context: Mutex<Option<ForegroundContext>>,
}

impl FakeForeground {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tab_id: u64, url: &str) {
        *self.context.lock().expect("foreground lock") = Some(ForegroundContext {
            tab_id,
            url: url.to_string(),
        });
    }
}

#[async_trait]
impl ForegroundQuery for FakeForeground {
    async fn active_context(&self) -> Option<ForegroundContext> {
        self.context.lock().expect("foreground lock").clone()
    }
}

/// Runs the synthesizer against an in-memory event list for each injection.
#[derive(Default)]
pub struct RecordingInjector {
    injected: Mutex<Vec<(u64, ShortcutSpec)>>,
    events: Mutex<Vec<KeyboardEvent>>,
    refuse: Mutex<bool>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn injected(&self) -> Vec<(u64, ShortcutSpec)> {
        self.injected.lock().expect("injector lock").clone()
    }

    pub fn dispatched_events(&self) -> usize {
        self.events.lock().expect("injector lock").len()
    }

    pub fn fail_with_refusal(&self) {
        *self.refuse.lock().expect("injector lock") = true;
    }
}

#[async_trait]
impl PageInjector for RecordingInjector {
    async fn inject(&self, tab_id: u64, spec: &ShortcutSpec) -> Result<(), InjectionError> {
        if *self.refuse.lock().expect("injector lock") {
            return Err(InjectionError::Refused("page is not scriptable".to_string()));
        }
        self.injected
            .lock()
            .expect("injector lock")
            .push((tab_id, spec.clone()));
        synthesize(spec, &mut *self.events.lock().expect("injector lock"));
        Ok(())
    }
}
