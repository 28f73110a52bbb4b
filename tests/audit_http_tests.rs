use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use kliksy_gate::{
    AccessGate, AuditDispatch, GateConfig, HistoryNavigator, Trigger,
    audit::{AuditError, AuditNotifier, HttpAuditNotifier},
    models::AuditPayload,
    session::DEFAULT_STORAGE_KEY,
    storage::{KeyValueStore, MemoryStore},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

// --- Stub Audit Endpoint ---

#[derive(Clone)]
struct Endpoint {
    status: StatusCode,
    delay: Duration,
    received: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn record_logout(
    State(endpoint): State<Endpoint>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    endpoint.received.lock().unwrap().push((content_type, body));

    tokio::time::sleep(endpoint.delay).await;
    endpoint.status
}

async fn spawn_endpoint(status: StatusCode, delay: Duration) -> (String, Endpoint) {
    let endpoint = Endpoint {
        status,
        delay,
        received: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/logout", post(record_logout))
        .with_state(endpoint.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/logout"), endpoint)
}

/// An address nothing listens on.
async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn payload() -> AuditPayload {
    AuditPayload {
        email: "a@x.com".to_string(),
        username: "a".to_string(),
    }
}

// --- Notifier Tests ---

#[tokio::test]
async fn test_posts_json_payload() {
    let (url, endpoint) = spawn_endpoint(StatusCode::OK, Duration::ZERO).await;
    let notifier = HttpAuditNotifier::new(url, Duration::from_secs(5)).unwrap();

    notifier.notify_logout(&payload()).await.unwrap();

    let received = endpoint.received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0.as_deref(), Some("application/json"));
    assert_eq!(
        received[0].1,
        json!({"email": "a@x.com", "username": "a"})
    );
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (url, _endpoint) = spawn_endpoint(StatusCode::NOT_FOUND, Duration::ZERO).await;
    let notifier = HttpAuditNotifier::new(url, Duration::from_secs(5)).unwrap();

    let result = notifier.notify_logout(&payload()).await;
    assert!(matches!(result, Err(AuditError::Rejected(status)) if status.as_u16() == 404));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_reported() {
    let addr = dead_address().await;
    let notifier =
        HttpAuditNotifier::new(format!("http://{addr}/logout"), Duration::from_secs(5)).unwrap();

    let result = notifier.notify_logout(&payload()).await;
    assert!(matches!(result, Err(AuditError::Transport(_))));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let (url, _endpoint) = spawn_endpoint(StatusCode::OK, Duration::from_secs(10)).await;
    let notifier = HttpAuditNotifier::new(url, Duration::from_millis(200)).unwrap();

    let result = notifier.notify_logout(&payload()).await;
    match result {
        Err(AuditError::Transport(e)) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

// --- Gate Wiring ---

fn gate_for(url: String, store: &MemoryStore, navigator: &HistoryNavigator) -> AccessGate {
    let config = GateConfig {
        audit_endpoint: Some(url),
        audit_timeout: Duration::from_secs(2),
        ..GateConfig::default()
    };
    AccessGate::from_config(config, Arc::new(store.clone()), Arc::new(navigator.clone())).unwrap()
}

#[tokio::test]
async fn test_gate_logout_reaches_configured_endpoint() {
    let (url, endpoint) = spawn_endpoint(StatusCode::OK, Duration::ZERO).await;
    let store = MemoryStore::new();
    store
        .set(
            DEFAULT_STORAGE_KEY,
            r#"{"id":3,"email":"a@x.com","username":"a"}"#,
        )
        .unwrap();
    let navigator = HistoryNavigator::new("/feed.html");
    let gate = gate_for(url, &store, &navigator);

    let allowed = gate.evaluate(Trigger::Load).into_allowed().unwrap();
    let outcome = allowed.logout(None).await;
    if let AuditDispatch::Dispatched(handle) = outcome.audit {
        handle.await.unwrap();
    } else {
        panic!("audit should have been dispatched");
    }

    assert_eq!(store.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    assert_eq!(navigator.navigations(), vec!["index.html"]);
    // Opaque fields like `id` are not forwarded.
    let received = endpoint.received.lock().unwrap().clone();
    assert_eq!(received[0].1, json!({"email": "a@x.com", "username": "a"}));
}

#[tokio::test]
async fn test_gate_logout_with_dead_endpoint_still_logs_out() {
    let addr = dead_address().await;
    let store = MemoryStore::new();
    store
        .set(DEFAULT_STORAGE_KEY, r#"{"email":"a@x.com","username":"a"}"#)
        .unwrap();
    let navigator = HistoryNavigator::new("/upload.html");
    let gate = gate_for(format!("http://{addr}/logout"), &store, &navigator);

    let allowed = gate.evaluate(Trigger::Load).into_allowed().unwrap();
    let outcome = allowed.logout(None).await;
    if let AuditDispatch::Dispatched(handle) = outcome.audit {
        handle.await.unwrap();
    }

    assert_eq!(store.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    assert_eq!(navigator.navigations(), vec!["index.html"]);
}

#[test]
fn test_gate_without_endpoint_builds_without_audit() {
    let store = MemoryStore::new();
    let navigator = HistoryNavigator::new("/index.html");
    let gate = AccessGate::from_config(
        GateConfig::default(),
        Arc::new(store),
        Arc::new(navigator),
    );
    assert!(gate.is_ok());
}
