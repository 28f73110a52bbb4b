//! Client-side session gate for the Kliksy site.
//!
//! On every page load and every page re-activation the [`AccessGate`] decides whether the
//! current page is reachable with the visitor's session, redirecting when it is not. Pages
//! that are let through receive an [`AllowedPage`] handle exposing the live session and the
//! audited logout.
//!
//! This is a UX routing convenience, not a security boundary: authorization is enforced by
//! the backend.

// --- Module Structure ---

// Leaf collaborators: persisted slot, page naming, location, outbound audit.
pub mod audit;
pub mod models;
pub mod navigation;
pub mod page;
pub mod session;
pub mod storage;

// The gate itself, plus its startup configuration and logging.
pub mod config;
pub mod gate;
pub mod telemetry;

// --- Public Re-exports ---

pub use audit::{AuditNotifier, HttpAuditNotifier, MockAuditNotifier};
pub use config::{Env, GateConfig};
pub use gate::{AccessGate, AllowedPage, AuditDispatch, GateOutcome, LogoutOutcome, Trigger};
pub use models::{AuditPayload, SessionRecord};
pub use navigation::{HistoryNavigator, Navigator, RedirectOutcome};
pub use page::PageClass;
pub use session::SessionStore;
pub use storage::{DirectoryStore, KeyValueStore, MemoryStore};
