use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// StoreError
///
/// Failures raised by a `KeyValueStore` backend. These never reach callers of the gate:
/// the session accessor logs them and degrades to "no session".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("value encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

// 1. KeyValueStore Contract
/// KeyValueStore
///
/// A synchronous, origin-scoped string key/value store that survives navigation and reload
/// but not manual clearing. This is the seam that stands in for the browser's local storage,
/// so the gate can run against an in-memory map in tests and against the filesystem in the
/// host binary without any change to the calling code.
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`, or `None` when the slot is empty.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites the slot. Last writer wins; there is no transaction.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Empties the slot. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// 2. The Persistent Implementation (one directory per origin)
/// DirectoryStore
///
/// Keeps each key in its own file under an origin directory, so touching one slot can never
/// read or rewrite another. Keys must be plain file names; anything with a path separator or
/// a `.`/`..` component is rejected rather than rewritten, so two keys never share a file.
/// Writes go through a per-write staging file and a rename, which keeps a reader in another
/// process from observing a half-written value.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.slot")))
    }

    /// Unique per process and per write, so concurrent writers never share a staging file.
    fn staging_path(&self, key: &str) -> PathBuf {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{key}.slot.{}.{seq}.tmp", std::process::id()))
    }
}

impl KeyValueStore for DirectoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.root)?;

        let staging = self.staging_path(key);
        fs::write(&staging, value)?;
        if let Err(e) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// validate_key
///
/// Accepts only keys that are usable verbatim as a file name inside the origin directory:
/// non-empty, not `.` or `..`, and free of path separators and NUL. Rejecting instead of
/// rewriting keeps the key-to-file mapping one-to-one.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let unusable = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if unusable {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// 3. The In-Memory Implementation (tests, embedded hosts)
/// MemoryStore
///
/// A mutex-guarded map. Clones share the same map, which is how tests model several tabs of
/// one origin writing to the same slot.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots, across all keys.
    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let slots = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }
}

/// StoreState
///
/// The shared handle used by the session accessor.
pub type StoreState = Arc<dyn KeyValueStore>;
