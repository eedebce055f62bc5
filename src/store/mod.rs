//! Durable string key/value store with a synchronous in-memory view.
//!
//! The backing store (`StoreBackend`) is slow and fallible; the `KvStore`
//! keeps every value in memory so reads are synchronous and writes are
//! fire-and-forget. The in-memory view is the source of truth for the
//! running process; a crash before flush may lose the most recent write,
//! which callers tolerate by re-deriving state (re-fetch from the API).
//!
//! One store instance is constructed at startup and passed explicitly
//! into each cache and service.

pub mod backend;
pub mod keys;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

pub use backend::{FileBackend, MemoryBackend, StoreBackend};

pub struct KvStore {
    cache: Mutex<HashMap<String, String>>,
    backend: Arc<dyn StoreBackend>,
}

impl KvStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            backend,
        }
    }

    /// Populate the memory cache from the backing store. Called once at
    /// process start; until it completes, reads return `None` and callers
    /// treat that as a cold cache, not an error.
    pub async fn initialize(&self) {
        match self.backend.read_all() {
            Ok(entries) => {
                let count = entries.len();
                let mut cache = self.cache.lock().expect("store cache lock");
                for (key, value) in entries {
                    cache.entry(key).or_insert(value);
                }
                debug!(count, "Store cache initialized");
            }
            Err(e) => {
                // Treated as an empty store; everything re-derives from the API
                warn!(error = %e, "Failed to initialize store cache");
            }
        }
    }

    /// Synchronous read from the memory cache.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.cache.lock().expect("store cache lock").get(key).cloned()
    }

    /// Update the memory cache immediately and persist in the background.
    /// Persistence failure is logged, never surfaced.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.cache
            .lock()
            .expect("store cache lock")
            .insert(key.to_string(), value.clone());
        let backend = Arc::clone(&self.backend);
        let key = key.to_string();
        Self::spawn_persist(move || backend.write(&key, &value), "write");
    }

    pub fn delete(&self, key: &str) {
        self.cache.lock().expect("store cache lock").remove(key);
        let backend = Arc::clone(&self.backend);
        let key = key.to_string();
        Self::spawn_persist(move || backend.remove(&key), "remove");
    }

    pub fn clear_all(&self) {
        self.cache.lock().expect("store cache lock").clear();
        let backend = Arc::clone(&self.backend);
        Self::spawn_persist(move || backend.clear(), "clear");
    }

    /// Run a best-effort persistence operation off the caller's path.
    /// Outside a runtime (plain unit tests) the write happens inline with
    /// the same swallow-and-log contract.
    fn spawn_persist<F>(op: F, what: &'static str)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = op() {
                        warn!(error = %e, op = what, "Store persistence failed");
                    }
                });
            }
            Err(_) => {
                if let Err(e) = op() {
                    warn!(error = %e, op = what, "Store persistence failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> KvStore {
        KvStore::new(Arc::new(MemoryBackend::default()))
    }

    #[test]
    fn test_read_your_writes() {
        let store = memory_store();
        assert_eq!(store.get_string("k"), None);

        store.set("k", "v1");
        assert_eq!(store.get_string("k"), Some("v1".to_string()));

        store.set("k", "v2");
        assert_eq!(store.get_string("k"), Some("v2".to_string()));

        store.delete("k");
        assert_eq!(store.get_string("k"), None);
    }

    #[test]
    fn test_clear_all() {
        let store = memory_store();
        store.set("a", "1");
        store.set("b", "2");
        store.clear_all();
        assert_eq!(store.get_string("a"), None);
        assert_eq!(store.get_string("b"), None);
    }

    #[tokio::test]
    async fn test_initialize_populates_from_backend() {
        let backend = Arc::new(MemoryBackend::default());
        backend.write("seeded", "value").expect("seed backend");

        let store = KvStore::new(backend);
        assert_eq!(store.get_string("seeded"), None); // pre-load miss

        store.initialize().await;
        assert_eq!(store.get_string("seeded"), Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_initialize_keeps_newer_in_memory_value() {
        let backend = Arc::new(MemoryBackend::default());
        backend.write("k", "stale").expect("seed backend");

        let store = KvStore::new(backend);
        store.set("k", "fresh");
        store.initialize().await;
        assert_eq!(store.get_string("k"), Some("fresh".to_string()));
    }
}
