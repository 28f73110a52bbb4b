use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Persisted Schemas ---

/// SessionRecord
///
/// The persisted proof of login written by the external login flow under the well-known
/// storage key. Only `email` and `username` are interpreted by the gate; every other field
/// the login step chose to store (typically the user `id`) is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionRecord {
    pub email: String,
    pub username: String,

    /// Opaque fields from the login response. Flattened so a read-then-write keeps them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            extra: Map::new(),
        }
    }

    /// Looks up one of the opaque extra fields (e.g. `"id"`).
    pub fn extra_field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

// --- Outbound Payloads ---

/// AuditPayload
///
/// Body of the logout audit notification. Exactly `{"email", "username"}`; extras from the
/// session record are never forwarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditPayload {
    pub email: String,
    pub username: String,
}

impl From<&SessionRecord> for AuditPayload {
    fn from(record: &SessionRecord) -> Self {
        Self {
            email: record.email.clone(),
            username: record.username.clone(),
        }
    }
}
