use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::storage::{SettingsStore, StorageError, load_origins, save_origins};

/// Origins the user opted into, read fresh from the store on every call.
///
/// Writes are read-modify-write sequences over one stored list, so they pass
/// through `write_gate` one at a time.
pub struct ActivationRegistry {
    store: Arc<dyn SettingsStore>,
    write_gate: Mutex<()>,
}

impl ActivationRegistry {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            write_gate: Mutex::new(()),
        }
    }

    pub async fn origins(&self) -> Result<Vec<String>, StorageError> {
        load_origins(self.store.as_ref()).await
    }

    pub async fn is_active(&self, origin: &str) -> Result<bool, StorageError> {
        let origins = self.origins().await?;
        Ok(origins.iter().any(|candidate| candidate == origin))
    }

    pub async fn activate(&self, origin: &str) -> Result<(), StorageError> {
        let _gate = self.write_gate.lock().await;
        let mut origins = self.origins().await?;
        if origins.iter().any(|candidate| candidate == origin) {
            return Ok(());
        }

        origins.push(origin.to_string());
        save_origins(self.store.as_ref(), &origins).await?;
        info!(origin, "autosave activated for origin");
        Ok(())
    }

    pub async fn deactivate(&self, origin: &str) -> Result<(), StorageError> {
        let _gate = self.write_gate.lock().await;
        let mut origins = self.origins().await?;
        let before = origins.len();
        origins.retain(|candidate| candidate != origin);
        if origins.len() == before {
            return Ok(());
        }

        save_origins(self.store.as_ref(), &origins).await?;
        info!(origin, "autosave deactivated for origin");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn registry() -> (Arc<MemoryStore>, ActivationRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = ActivationRegistry::new(store.clone());
        (store, registry)
    }

    #[tokio::test]
    async fn activate_twice_keeps_single_entry() {
        let (store, registry) = registry();
        registry.activate("https://a.example").await.expect("activate");
        registry.activate("https://a.example").await.expect("activate again");

        assert_eq!(
            load_origins(store.as_ref()).await.expect("load"),
            vec!["https://a.example".to_string()]
        );
        assert!(registry.is_active("https://a.example").await.expect("query"));
    }

    #[tokio::test]
    async fn deactivate_absent_origin_leaves_set_unchanged() {
        let (_store, registry) = registry();
        registry.activate("https://a.example").await.expect("activate");
        registry.deactivate("https://b.example").await.expect("deactivate");

        assert_eq!(
            registry.origins().await.expect("load"),
            vec!["https://a.example".to_string()]
        );
    }

    #[tokio::test]
    async fn membership_is_exact_match() {
        let (_store, registry) = registry();
        registry.activate("https://a.example").await.expect("activate");

        assert!(!registry.is_active("https://a.example:8443").await.expect("query"));
        assert!(!registry.is_active("http://a.example").await.expect("query"));
        registry.deactivate("https://a.example").await.expect("deactivate");
        assert!(!registry.is_active("https://a.example").await.expect("query"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_activations_are_not_lost() {
        let (_store, registry) = registry();
        let registry = Arc::new(registry);

        let mut handles = Vec::new();
        for index in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .activate(&format!("https://site{index}.example"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("task should join").expect("activate");
        }

        assert_eq!(registry.origins().await.expect("load").len(), 32);
    }
}
