use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::DEFAULT_STORAGE_KEY;

/// Canonical page a sessionless visitor is sent to.
pub const DEFAULT_ENTRY_PAGE: &str = "index.html";
/// Canonical page an authenticated visitor lands on.
pub const DEFAULT_LANDING_PAGE: &str = "feed.html";
pub const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_STORE_DIR: &str = ".kliksy-store";

/// GateConfig
///
/// Holds the gate's entire configuration. Immutable once loaded and cheap to clone, so every
/// gate instance (one per page, or one per tab) works from the same values.
#[derive(Clone, Debug)]
pub struct GateConfig {
    // Runtime environment marker. Controls log format and the audit endpoint requirement.
    pub env: Env,
    // Well-known key of the session slot.
    pub storage_key: String,
    // Logout audit URL. `None` disables the audit notification entirely.
    pub audit_endpoint: Option<String>,
    // Whole-request timeout for the audit POST.
    pub audit_timeout: Duration,
    // Where a visitor without a session is redirected, and the default logout target.
    pub entry_page: String,
    // Where a visitor with a session is redirected from public pages.
    pub landing_page: String,
    // Origin directory for the directory-backed store used by the host binary.
    pub store_dir: PathBuf,
}

/// Env
///
/// Runtime context. Production demands an audit endpoint and logs JSON; local is lenient and
/// logs human-readable output.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for GateConfig {
    /// default
    ///
    /// Safe, non-panicking values for test setup: no audit endpoint, so no network is touched.
    fn default() -> Self {
        Self {
            env: Env::Local,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            audit_endpoint: None,
            audit_timeout: DEFAULT_AUDIT_TIMEOUT,
            entry_page: DEFAULT_ENTRY_PAGE.to_string(),
            landing_page: DEFAULT_LANDING_PAGE.to_string(),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
        }
    }
}

impl GateConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in production when `LOGOUT_ENDPOINT` is missing, so a deployment cannot silently
    /// lose its logout audit trail.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let audit_endpoint = match env {
            Env::Production => Some(
                env::var("LOGOUT_ENDPOINT")
                    .expect("FATAL: LOGOUT_ENDPOINT must be set in production."),
            ),
            // Locally auditing is opt-in; a blank value counts as unset.
            Env::Local => env::var("LOGOUT_ENDPOINT")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        };

        let audit_timeout = env::var("AUDIT_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_AUDIT_TIMEOUT);

        Self {
            env,
            storage_key: env::var("KLIKSY_STORAGE_KEY")
                .unwrap_or_else(|_| DEFAULT_STORAGE_KEY.to_string()),
            audit_endpoint,
            audit_timeout,
            entry_page: DEFAULT_ENTRY_PAGE.to_string(),
            landing_page: DEFAULT_LANDING_PAGE.to_string(),
            store_dir: env::var("KLIKSY_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_DIR)),
        }
    }
}
