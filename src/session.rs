use crate::models::SessionRecord;
use crate::storage::{StoreError, StoreState};

/// Default well-known key the login flow writes the session under.
pub const DEFAULT_STORAGE_KEY: &str = "kliksyUser";

/// SessionStore
///
/// The session accessor. Owns exactly one slot of the underlying store (the well-known key)
/// and never reads or writes any other. Reads are total: a missing, unreadable or corrupt
/// slot all come back as "no session".
#[derive(Clone)]
pub struct SessionStore {
    store: StoreState,
    key: String,
}

impl SessionStore {
    pub fn new(store: StoreState, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// read
    ///
    /// Returns the current session, re-reading the store on every call.
    ///
    /// 1. Empty slot, an empty string or JSON `null`: absent, slot left alone.
    /// 2. A value that does not decode to a `SessionRecord`: the slot is cleared (self-healing)
    ///    and the session is absent.
    /// 3. Backend failure: logged, absent.
    pub fn read(&self) -> Option<SessionRecord> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "session slot unreadable, treating as logged out");
                return None;
            }
        };

        // Whitespace-only values fall through to the decode failure below and get cleared.
        if raw.is_empty() {
            return None;
        }

        match serde_json::from_str::<Option<SessionRecord>>(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "corrupt session record, clearing slot");
                self.clear();
                None
            }
        }
    }

    /// Convenience for `read().is_some()`.
    pub fn is_present(&self) -> bool {
        self.read().is_some()
    }

    /// clear
    ///
    /// Removes the slot unconditionally. Idempotent; a backend failure is logged and swallowed.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "failed to clear session slot");
        }
    }

    /// write
    ///
    /// Persists a session record. This is the login flow's side of the contract; the gate
    /// itself only ever reads and clears.
    pub fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.store.set(&self.key, &raw)
    }
}
