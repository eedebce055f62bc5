use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Persistence behind the `KvStore` memory cache. Only the store layer
/// ever touches the backend; other components go through the cache so
/// there is a single source of truth per process.
pub trait StoreBackend: Send + Sync {
    fn read_all(&self) -> Result<HashMap<String, String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File extension for persisted entries
const ENTRY_EXTENSION: &str = "kv";

/// One file per key under a dedicated directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, ENTRY_EXTENSION))
    }
}

impl StoreBackend for FileBackend {
    fn read_all(&self) -> Result<HashMap<String, String>> {
        let mut entries = HashMap::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read store directory: {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let value = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store entry: {}", path.display()))?;
            entries.insert(key.to_string(), value);
        }
        Ok(entries)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::write(self.entry_path(key), value)
            .with_context(|| format!("Failed to write store entry: {}", key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove store entry: {}", key))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION) {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// Ephemeral backend for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl StoreBackend for MemoryBackend {
    fn read_all(&self) -> Result<HashMap<String, String>> {
        Ok(self.entries.lock().expect("memory backend lock").clone())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("memory backend lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().expect("memory backend lock").remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().expect("memory backend lock").clear();
        Ok(())
    }
}
