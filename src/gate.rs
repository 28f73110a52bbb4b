use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    audit::{AuditError, AuditState, HttpAuditNotifier},
    config::GateConfig,
    models::{AuditPayload, SessionRecord},
    navigation::{NavigatorState, RedirectOutcome, redirect_to},
    page::{self, PageClass},
    session::SessionStore,
    storage::StoreState,
};

/// Upper bound on chained redirects followed by `AccessGate::settle`.
pub const MAX_REDIRECT_HOPS: usize = 4;

/// Trigger
///
/// Why an evaluation is running. The decision does not depend on it; it is carried into the
/// logs so a redirect after a back/forward restore can be told apart from one on first load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Load,
    /// The page was restored from history or the back/forward cache.
    PageShow,
}

/// Decision
///
/// The pure outcome of the gate's state machine, before any navigation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(String),
}

/// decide
///
/// `protected` without a session goes to the entry page, `public` with a session goes to the
/// landing page, everything else is allowed.
pub fn decide(class: PageClass, session_present: bool, config: &GateConfig) -> Decision {
    match (class, session_present) {
        (PageClass::Protected, false) => Decision::RedirectTo(config.entry_page.clone()),
        (PageClass::Public, true) => Decision::RedirectTo(config.landing_page.clone()),
        _ => Decision::Allow,
    }
}

/// AccessGate
///
/// The decision unit for one page. Holds no state of its own beyond its collaborators, so the
/// host may call `evaluate` as often as it likes (first load, every re-activation) and each
/// call starts from whatever the store holds at that moment.
#[derive(Clone)]
pub struct AccessGate {
    session: SessionStore,
    navigator: NavigatorState,
    audit: Option<AuditState>,
    config: GateConfig,
}

impl AccessGate {
    /// Builds a gate without auditing. Use `with_audit` to attach a notifier.
    pub fn new(config: GateConfig, store: StoreState, navigator: NavigatorState) -> Self {
        let session = SessionStore::new(store, config.storage_key.clone());
        Self {
            session,
            navigator,
            audit: None,
            config,
        }
    }

    /// from_config
    ///
    /// Builds a gate and, when `config.audit_endpoint` is set, an HTTP audit notifier for it.
    /// Fails only if the HTTP client cannot be constructed.
    pub fn from_config(
        config: GateConfig,
        store: StoreState,
        navigator: NavigatorState,
    ) -> Result<Self, AuditError> {
        let audit = match &config.audit_endpoint {
            Some(endpoint) => Some(Arc::new(HttpAuditNotifier::new(
                endpoint.clone(),
                config.audit_timeout,
            )?) as AuditState),
            None => None,
        };

        let gate = Self::new(config, store, navigator);
        Ok(match audit {
            Some(notifier) => gate.with_audit(notifier),
            None => gate,
        })
    }

    pub fn with_audit(mut self, audit: AuditState) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// evaluate
    ///
    /// Reads the session, classifies the current page and either redirects or hands back the
    /// `AllowedPage` handle. Synchronous and never fails.
    pub fn evaluate(&self, trigger: Trigger) -> GateOutcome {
        let path = self.navigator.current_path();
        let name = page::page_name(&path);
        let class = page::classify_name(&name);
        let session_present = self.session.is_present();

        match decide(class, session_present, &self.config) {
            Decision::Allow => {
                tracing::debug!(?trigger, page = %name, ?class, session_present, "page allowed");
                GateOutcome::Allowed(AllowedPage {
                    gate: self.clone(),
                    page: name,
                    class,
                })
            }
            Decision::RedirectTo(target) => {
                tracing::info!(?trigger, page = %name, ?class, session_present, %target, "page not reachable");
                let outcome = redirect_to(self.navigator.as_ref(), &target);
                GateOutcome::Redirected { class, outcome }
            }
        }
    }

    /// settle
    ///
    /// Evaluates, then keeps evaluating after every redirect that actually navigated, the way a
    /// browser runs the gate again on the page it lands on. Stops at the first allowed page, at
    /// a suppressed redirect, or after `MAX_REDIRECT_HOPS` navigations.
    pub fn settle(&self, trigger: Trigger) -> GateOutcome {
        let mut outcome = self.evaluate(trigger);
        for _ in 0..MAX_REDIRECT_HOPS {
            let navigated = outcome.redirect().is_some_and(RedirectOutcome::navigated);
            if !navigated {
                break;
            }
            outcome = self.evaluate(Trigger::Load);
        }
        outcome
    }

    async fn logout(&self, target: Option<&str>) -> LogoutOutcome {
        let target = target.unwrap_or(self.config.entry_page.as_str());

        // The payload is captured before the slot is cleared; the task owns its copy.
        let audit = match (self.session.read(), &self.audit) {
            (None, _) => AuditDispatch::Skipped(SkipReason::NoSession),
            (Some(_), None) => AuditDispatch::Skipped(SkipReason::NotConfigured),
            (Some(record), Some(notifier)) => {
                let payload = AuditPayload::from(&record);
                let notifier = Arc::clone(notifier);
                AuditDispatch::Dispatched(tokio::spawn(deliver_audit(notifier, payload)))
            }
        };

        self.session.clear();
        let redirect = redirect_to(self.navigator.as_ref(), target);

        tracing::info!(%target, navigated = redirect.navigated(), "logged out");
        LogoutOutcome { audit, redirect }
    }
}

async fn deliver_audit(notifier: AuditState, payload: AuditPayload) {
    match notifier.notify_logout(&payload).await {
        Ok(()) => tracing::debug!(email = %payload.email, "logout audit delivered"),
        Err(e) => tracing::warn!(email = %payload.email, error = %e, "logout audit failed"),
    }
}

/// GateOutcome
///
/// Result of one evaluation. The `AllowedPage` handle only exists on the allowed branch, so
/// code that needs session state cannot run on a page the gate turned away.
#[derive(Debug)]
pub enum GateOutcome {
    Allowed(AllowedPage),
    Redirected {
        class: PageClass,
        outcome: RedirectOutcome,
    },
}

impl GateOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateOutcome::Allowed(_))
    }

    pub fn allowed(&self) -> Option<&AllowedPage> {
        match self {
            GateOutcome::Allowed(page) => Some(page),
            GateOutcome::Redirected { .. } => None,
        }
    }

    pub fn into_allowed(self) -> Option<AllowedPage> {
        match self {
            GateOutcome::Allowed(page) => Some(page),
            GateOutcome::Redirected { .. } => None,
        }
    }

    pub fn redirect(&self) -> Option<&RedirectOutcome> {
        match self {
            GateOutcome::Allowed(_) => None,
            GateOutcome::Redirected { outcome, .. } => Some(outcome),
        }
    }
}

/// AllowedPage
///
/// The session API handed to page scripts once the gate has let the page through. Getters
/// re-read the store on every call; nothing is cached.
#[derive(Clone)]
pub struct AllowedPage {
    gate: AccessGate,
    page: String,
    class: PageClass,
}

impl AllowedPage {
    /// Well-known key of the session slot, for introspection.
    pub fn storage_key(&self) -> &str {
        self.gate.session.key()
    }

    pub fn current_user(&self) -> Option<SessionRecord> {
        self.gate.session.read()
    }

    pub fn is_logged_in(&self) -> bool {
        self.gate.session.is_present()
    }

    /// Normalized name of the allowed page, the label the navigation injector marks active.
    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn class(&self) -> PageClass {
        self.class
    }

    /// logout
    ///
    /// Clears the session and redirects to `target` (default: the entry page), with the usual
    /// self-redirect suppression. When a session existed and auditing is configured, the audit
    /// notification runs on a detached task; clearing and redirecting never wait for it.
    /// After this returns the slot is empty.
    pub async fn logout(&self, target: Option<&str>) -> LogoutOutcome {
        self.gate.logout(target).await
    }
}

impl fmt::Debug for AllowedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllowedPage")
            .field("page", &self.page)
            .field("class", &self.class)
            .field("storage_key", &self.storage_key())
            .finish()
    }
}

/// SkipReason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSession,
    NotConfigured,
}

/// AuditDispatch
///
/// Whether logout handed a notification to a detached task. The join handle lets a host that
/// is about to exit wait for delivery; dropping it does not cancel the task.
#[derive(Debug)]
pub enum AuditDispatch {
    Skipped(SkipReason),
    Dispatched(JoinHandle<()>),
}

/// LogoutOutcome
#[derive(Debug)]
pub struct LogoutOutcome {
    pub audit: AuditDispatch,
    pub redirect: RedirectOutcome,
}
