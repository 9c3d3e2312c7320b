//! Durable Tier Module
//!
//! String key/value stores that outlive the process. The cache treats every
//! operation here as best-effort.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Default quota, in bytes of keys plus values.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// == Durable Store Trait ==
/// Persistent string key/value namespace backing the memory tier.
pub trait DurableStore: Send + Sync + Debug {
    /// Reads the raw record stored under `key`.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes `raw` under `key`, replacing any previous record.
    fn save(&mut self, key: &str, raw: &str) -> StorageResult<()>;

    /// Deletes `key`; absent keys are not an error.
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Deletes every key in `keys` as one operation.
    fn remove_many(&mut self, keys: &[String]) -> StorageResult<()> {
        keys.iter().try_for_each(|key| self.remove(key))
    }

    /// Lists every stored key.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Bytes a record occupies against the quota.
fn record_size(key: &str, raw: &str) -> usize {
    key.len() + raw.len()
}

/// Usage after replacing `key`'s record with `raw`.
fn usage_after(entries: &HashMap<String, String>, used: usize, key: &str, raw: &str) -> usize {
    let previous = entries
        .get(key)
        .map(|old| record_size(key, old))
        .unwrap_or(0);
    used - previous + record_size(key, raw)
}

// == Disabled Store ==
/// Durable tier that stores nothing; the cache runs memory-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDurableStore;

impl DurableStore for NoDurableStore {
    fn load(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn save(&mut self, _key: &str, _raw: &str) -> StorageResult<()> {
        Ok(())
    }

    fn remove(&mut self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(Vec::new())
    }
}

// == Memory Store ==
#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    used: usize,
}

/// In-process durable tier with an optional quota.
///
/// Clones share the same namespace, which lets several cache stores see one
/// "storage" the way browser tabs share local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryDurableStore {
    state: Arc<Mutex<MemoryState>>,
    quota: Option<usize>,
}

impl MemoryDurableStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            state: Arc::default(),
            quota: Some(quota),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DurableStore for MemoryDurableStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock().entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, raw: &str) -> StorageResult<()> {
        let quota = self.quota;
        let mut state = self.lock();
        let needed = usage_after(&state.entries, state.used, key, raw);
        if let Some(limit) = quota {
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        state.entries.insert(key.to_string(), raw.to_string());
        state.used = needed;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let mut state = self.lock();
        if let Some(old) = state.entries.remove(key) {
            state.used -= record_size(key, &old);
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.lock().entries.keys().cloned().collect())
    }
}

// == File Store ==
/// Durable tier persisted as a single JSON object on disk.
///
/// The whole file is read at open and rewritten (via a temp file and a
/// rename) after every change. Other processes writing the same file are not
/// coordinated with; the last writer wins.
#[derive(Debug)]
pub struct FileDurableStore {
    path: PathBuf,
    entries: HashMap<String, String>,
    used: usize,
    quota: usize,
}

impl FileDurableStore {
    /// Opens (or starts) the store at `path`.
    ///
    /// A missing file yields an empty store. An unparsable file is discarded
    /// with a warning. Other I/O failures are returned.
    pub fn open(path: impl Into<PathBuf>, quota: usize) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable cache file");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };
        let used = entries
            .iter()
            .map(|(key, raw)| record_size(key, raw))
            .sum();

        debug!(path = %path.display(), entries = entries.len(), "Durable cache tier opened");

        Ok(Self {
            path,
            entries,
            used,
            quota,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DurableStore for FileDurableStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, raw: &str) -> StorageResult<()> {
        let needed = usage_after(&self.entries, self.used, key, raw);
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed,
                limit: self.quota,
            });
        }

        let previous = self.entries.insert(key.to_string(), raw.to_string());
        if let Err(e) = self.flush() {
            // Keep the in-process view identical to what is on disk.
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        self.used = needed;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let Some(old) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush() {
            self.entries.insert(key.to_string(), old);
            return Err(e);
        }
        self.used -= record_size(key, &old);
        Ok(())
    }

    fn remove_many(&mut self, keys: &[String]) -> StorageResult<()> {
        let removed: Vec<(String, String)> = keys
            .iter()
            .filter_map(|key| self.entries.remove_entry(key))
            .collect();
        if removed.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.flush() {
            self.entries.extend(removed);
            return Err(e);
        }
        self.used -= removed
            .iter()
            .map(|(key, raw)| record_size(key, raw))
            .sum::<usize>();
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}
