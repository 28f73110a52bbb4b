use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::models::AuditPayload;

/// AuditError
///
/// Why a logout audit notification was not delivered. Only ever logged.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("audit endpoint answered {0}")]
    Rejected(reqwest::StatusCode),
    #[error("{0}")]
    Simulated(String),
}

// 1. AuditNotifier Contract
/// AuditNotifier
///
/// Records a logout server-side. Delivery is best-effort: the gate runs this on a detached
/// task and only logs the result, so an implementation is free to be slow or to fail.
#[async_trait]
pub trait AuditNotifier: Send + Sync {
    async fn notify_logout(&self, payload: &AuditPayload) -> Result<(), AuditError>;
}

// 2. The Real Implementation (HTTP POST to the logout endpoint)
/// HttpAuditNotifier
///
/// Sends `POST <endpoint>` with a JSON `{email, username}` body. The response body is never
/// read; any non-2xx status counts as a failed delivery.
#[derive(Clone)]
pub struct HttpAuditNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuditNotifier {
    /// new
    ///
    /// Builds the client with a whole-request timeout, so a hung endpoint still resolves the
    /// detached audit task eventually.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AuditNotifier for HttpAuditNotifier {
    async fn notify_logout(&self, payload: &AuditPayload) -> Result<(), AuditError> {
        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::Rejected(status));
        }
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockBehavior
///
/// How a `MockAuditNotifier` answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockBehavior {
    Succeed,
    Fail,
    /// Never completes, like an endpoint that accepts the connection and goes silent.
    Hang,
}

/// MockAuditNotifier
///
/// Records every payload it is handed (before answering) so tests can assert what logout
/// tried to send, regardless of the simulated outcome.
#[derive(Clone)]
pub struct MockAuditNotifier {
    behavior: MockBehavior,
    received: Arc<Mutex<Vec<AuditPayload>>>,
}

impl MockAuditNotifier {
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Succeed)
    }

    pub fn new_failing() -> Self {
        Self::with_behavior(MockBehavior::Fail)
    }

    pub fn new_hanging() -> Self {
        Self::with_behavior(MockBehavior::Hang)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn received(&self) -> Vec<AuditPayload> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

impl Default for MockAuditNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditNotifier for MockAuditNotifier {
    async fn notify_logout(&self, payload: &AuditPayload) -> Result<(), AuditError> {
        if let Ok(mut received) = self.received.lock() {
            received.push(payload.clone());
        }

        match self.behavior {
            MockBehavior::Succeed => Ok(()),
            MockBehavior::Fail => Err(AuditError::Simulated(
                "Mock Audit Error: Simulation requested".to_string(),
            )),
            MockBehavior::Hang => std::future::pending::<Result<(), AuditError>>().await,
        }
    }
}

/// AuditState
///
/// The shared handle the gate holds when auditing is configured.
pub type AuditState = Arc<dyn AuditNotifier>;
