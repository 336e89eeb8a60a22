//! Best-effort client-local persistence for slider positions and judge identity.
//!
//! Backends report failures through [`KeyValueStore`]; [`LocalStateStore`] is the
//! boundary that swallows them so scoring never depends on the cache.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use dashmap::DashMap;
use tracing::warn;

use crate::judge::error::StoreError;

/// Storage key holding the judge's name.
pub const JUDGE_NAME_KEY: &str = "judge_name_input";
const SLIDER_KEY_PREFIX: &str = "judge_slider_";

/// Storage key holding the last white value of a category slider.
pub fn slider_key(category_key: &str) -> String {
    format!("{SLIDER_KEY_PREFIX}{category_key}")
}

/// Capability interface over an origin-scoped string key-value area.
pub trait KeyValueStore: Send + Sync {
    fn try_get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn try_set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn try_remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn try_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|value| value.value().clone()))
    }

    fn try_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn try_remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store that is never available, as in private browsing or after quota errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn try_get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }

    fn try_set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }

    fn try_remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }
}

/// Single JSON object on disk, rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let encoded = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn update<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        let mut entries = self.read_all()?;
        mutate(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn try_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn try_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn try_remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Infallible facade over a [`KeyValueStore`].
#[derive(Clone)]
pub struct LocalStateStore {
    backend: Arc<dyn KeyValueStore>,
}

impl LocalStateStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.try_get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "local store read failed; treating as absent");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.try_set(key, value) {
            warn!(key, error = %err, "local store write failed; value not cached");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(err) = self.backend.try_remove(key) {
            warn!(key, error = %err, "local store remove failed");
        }
    }

    /// Last persisted white value for a slider, clamped to `[0, max]`.
    ///
    /// Values that do not parse as a number are treated as absent.
    pub fn slider(&self, category_key: &str, max: u32) -> Option<u32> {
        let raw = self.get(&slider_key(category_key))?;
        let value = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(value.round().clamp(0.0, f64::from(max)) as u32)
    }

    pub fn save_slider(&self, category_key: &str, white: u32) {
        self.set(&slider_key(category_key), &white.to_string());
    }

    /// Remembered judge name, if any.
    pub fn judge_name(&self) -> Option<String> {
        self.get(JUDGE_NAME_KEY)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Remember `name`; a blank name forgets the stored one.
    pub fn save_judge_name(&self, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            self.remove(JUDGE_NAME_KEY);
        } else {
            self.set(JUDGE_NAME_KEY, trimmed);
        }
    }
}

impl Default for LocalStateStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
