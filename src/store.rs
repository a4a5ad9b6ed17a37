//! Persistence for progress state
//!
//! A store maps a learner key to one JSON blob. Loading never interprets
//! the blob; the sanitizer does that.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::atomic_file;
use crate::progress::ProgressState;

/// Error type for state storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub trait StateStore {
    /// Raw blob for `key`; `None` when nothing was saved yet
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn save(&mut self, key: &str, state: &ProgressState) -> Result<(), StoreError>;

    /// Load, update and save `key` as one unit.
    ///
    /// `update` gets the raw blob and returns the state to persist (or
    /// `None` to leave the blob alone) plus a value handed back to the
    /// caller. Other writers of the same key wait until it returns.
    fn transaction<T, F>(&mut self, key: &str, update: F) -> Result<T, StoreError>
    where
        Self: Sized,
        F: FnOnce(Option<Value>) -> (Option<ProgressState>, T),
    {
        let raw = self.load(key)?;
        let (next, value) = update(raw);
        if let Some(state) = next {
            self.save(key, &state)?;
        }
        Ok(value)
    }
}

/// One `<key>.json` file per learner under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_.-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let name = name.trim_start_matches('.');
        let name = if name.is_empty() { "default" } else { name };
        self.dir.join(format!("{}.json", name))
    }

    fn read(path: &Path) -> Result<Option<Value>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No saved state at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable state file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Take the key's lock, creating the directory on first use
    fn lock(&self, path: &Path) -> Result<std::fs::File, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        atomic_file::lock_exclusive(path).map_err(|source| StoreError::Lock {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write under a lock the caller already holds
    fn write(path: &Path, state: &ProgressState) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(state)?;
        atomic_file::replace(path, &content).map_err(|e| StoreError::io(path, e))?;
        debug!("Wrote state to {}", path.display());
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Self::read(&self.path_for(key))
    }

    fn save(&mut self, key: &str, state: &ProgressState) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let _lock = self.lock(&path)?;
        Self::write(&path, state)
    }

    fn transaction<T, F>(&mut self, key: &str, update: F) -> Result<T, StoreError>
    where
        F: FnOnce(Option<Value>) -> (Option<ProgressState>, T),
    {
        let path = self.path_for(key);
        let _lock = self.lock(&path)?;
        let (next, value) = update(Self::read(&path)?);
        if let Some(state) = next {
            Self::write(&path, &state)?;
        }
        Ok(value)
    }
}

/// In-process store, mainly for tests and batch runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an arbitrary blob in place, bypassing serialization
    pub fn insert_raw(&mut self, key: &str, value: Value) {
        self.blobs.insert(key.to_string(), value);
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, state: &ProgressState) -> Result<(), StoreError> {
        self.blobs
            .insert(key.to_string(), serde_json::to_value(state)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("nobody").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("state"));
        let mut state = ProgressState::default();
        state.totals.sessions = 4;

        store.save("learner", &state).unwrap();
        assert!(dir.path().join("state/learner.json").exists());

        let raw = store.load("learner").unwrap().unwrap();
        assert_eq!(raw["totals"]["sessions"], 4);
    }

    #[test]
    fn test_corrupt_file_is_none() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(store.path_for("learner"), "{ not json").unwrap();
        assert!(store.load("learner").unwrap().is_none());
    }

    #[test]
    fn test_key_cannot_escape_dir() {
        let store = JsonFileStore::new("/data");
        assert_eq!(
            store.path_for("../etc/passwd"),
            PathBuf::from("/data/_etc_passwd.json")
        );
        assert_eq!(store.path_for(""), PathBuf::from("/data/default.json"));
    }

    #[test]
    fn test_transaction_holds_lock_until_saved() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        let lock_path = atomic_file::lock_path(&store.path_for("learner"));

        let seen = store
            .transaction("learner", |raw| {
                let other = std::fs::File::open(&lock_path).unwrap();
                let blocked = fs2::FileExt::try_lock_exclusive(&other).is_err();
                let mut state = ProgressState::default();
                state.totals.sessions = 1;
                (Some(state), (raw.is_none(), blocked))
            })
            .unwrap();
        assert_eq!(seen, (true, true));

        let other = std::fs::File::open(&lock_path).unwrap();
        assert!(fs2::FileExt::try_lock_exclusive(&other).is_ok());
        assert_eq!(store.load("learner").unwrap().unwrap()["totals"]["sessions"], 1);
    }

    #[test]
    fn test_transaction_without_state_leaves_file() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        let value = store.transaction("learner", |_| (None, 7)).unwrap();
        assert_eq!(value, 7);
        assert!(!store.path_for("learner").exists());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load("a").unwrap().is_none());
        store.save("a", &ProgressState::default()).unwrap();
        assert_eq!(store.load("a").unwrap().unwrap()["version"], 1);
    }
}
