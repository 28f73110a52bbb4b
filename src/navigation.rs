use std::sync::{Arc, Mutex};

use crate::page;

/// Navigator
///
/// The host's view of the current location. In a browser this is `window.location`; here it
/// is injected so the gate can be driven by a CLI, an embedded webview or a test.
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown (e.g. `"/app/feed.html"`).
    fn current_path(&self) -> String;

    /// Leaves the current page for `target`. Fire-and-forget; hosts do not report failure.
    fn navigate(&self, target: &str);
}

pub type NavigatorState = Arc<dyn Navigator>;

/// RedirectOutcome
///
/// What a redirect request turned into. The two suppressed variants are normal outcomes,
/// not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Navigated { target: String },
    /// The target names the page already shown.
    SuppressedSelf { target: String },
    /// The target was empty.
    SuppressedEmpty,
}

impl RedirectOutcome {
    pub fn navigated(&self) -> bool {
        matches!(self, RedirectOutcome::Navigated { .. })
    }
}

/// redirect_to
///
/// Navigates to `target` unless it is empty or names the current page (case-insensitively).
/// Never issuing a self-redirect is what keeps an inconsistent classification from turning
/// into a reload loop.
pub fn redirect_to(navigator: &dyn Navigator, target: &str) -> RedirectOutcome {
    if target.trim().is_empty() {
        tracing::debug!("redirect with empty target ignored");
        return RedirectOutcome::SuppressedEmpty;
    }

    let current = navigator.current_path();
    if page::same_page(&current, target) {
        tracing::debug!(%target, %current, "self-redirect suppressed");
        return RedirectOutcome::SuppressedSelf {
            target: target.to_string(),
        };
    }

    tracing::info!(%target, from = %current, "redirecting");
    navigator.navigate(target);
    RedirectOutcome::Navigated {
        target: target.to_string(),
    }
}

/// HistoryNavigator
///
/// In-process navigator that records every navigation and moves its current path the way a
/// browser resolves a relative link: the last segment of the current path is replaced by the
/// target. Absolute targets (leading `/`) replace the whole path.
#[derive(Clone, Debug)]
pub struct HistoryNavigator {
    inner: Arc<Mutex<History>>,
}

#[derive(Debug, Default)]
struct History {
    current: String,
    visited: Vec<String>,
}

impl HistoryNavigator {
    pub fn new(start_path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(History {
                current: start_path.into(),
                visited: Vec::new(),
            })),
        }
    }

    /// Targets passed to `navigate`, oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|history| history.visited.clone())
            .unwrap_or_default()
    }

    /// Moves to `path` without recording a navigation (a user typing a URL, or a back/forward
    /// restore).
    pub fn set_current(&self, path: impl Into<String>) {
        if let Ok(mut history) = self.inner.lock() {
            history.current = path.into();
        }
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.inner
            .lock()
            .map(|history| history.current.clone())
            .unwrap_or_default()
    }

    fn navigate(&self, target: &str) {
        let Ok(mut history) = self.inner.lock() else {
            return;
        };
        history.current = resolve(&history.current, target);
        history.visited.push(target.to_string());
    }
}

fn resolve(current: &str, target: &str) -> String {
    if target.starts_with('/') {
        return target.to_string();
    }
    match current.rfind('/') {
        Some(idx) => format!("{}{}", &current[..=idx], target),
        None => target.to_string(),
    }
}
