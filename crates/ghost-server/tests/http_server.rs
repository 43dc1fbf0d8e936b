use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use ghost_server::{build_router, AppState};
use ghost_store::Store;
use ghost_testing::llm_stub::{canned_response, ScriptedLlmProvider};
use ghost_testing::{approved_ghost, pending_ghost};
use ghost_types::{IntentClass, SecureEventBatch};
use tokio::task::JoinHandle;
use uuid::Uuid;

fn start_server(state: Arc<AppState>) -> impl std::future::Future<Output = (SocketAddr, JoinHandle<()>)> {
    async move {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let router = build_router(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr, handle)
    }
}

fn sample_batch(device: &str, n: usize) -> SecureEventBatch {
    let events = (0..n).map(|i| ghost_testing::secure_event("org1", IntentClass::Navigation, "fp-1", i as u64)).collect();
    SecureEventBatch { events, device_fingerprint: device.to_string(), batch_id: Uuid::new_v4(), sent_at: Utc::now() }
}

#[tokio::test]
async fn ingest_events_accepts_a_well_formed_batch() {
    let store = Store::open_in_memory().unwrap();
    let state = AppState::new(store, Arc::new(ScriptedLlmProvider::new()));
    let (addr, _server) = start_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/ingest-events"))
        .json(&sample_batch("dev-a", 5))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["accepted"], 5);
}

/// §8 batch-size cap / scenario 2: a 101-event batch is rejected.
#[tokio::test]
async fn ingest_events_rejects_an_oversized_batch() {
    let store = Store::open_in_memory().unwrap();
    let state = AppState::new(store, Arc::new(ScriptedLlmProvider::new()));
    let (addr, _server) = start_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/ingest-events"))
        .json(&sample_batch("dev-b", 101))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BATCH_TOO_LARGE");
}

/// §8 rate-limit conformance / scenario 3: event #1001 from one device within
/// the rolling minute is rejected with Retry-After.
#[tokio::test]
async fn ingest_events_enforces_the_per_device_rate_limit() {
    let store = Store::open_in_memory().unwrap();
    let state = AppState::new(store, Arc::new(ScriptedLlmProvider::new()));
    let (addr, _server) = start_server(state).await;
    let client = reqwest::Client::new();

    let first = client.post(format!("http://{addr}/ingest-events")).json(&sample_batch("dev-c", 100)).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::ACCEPTED);

    // 9 more full batches of 100 reach exactly the 1000/minute budget.
    for _ in 0..9 {
        let response = client.post(format!("http://{addr}/ingest-events")).json(&sample_batch("dev-c", 100)).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    }

    let over_budget = client.post(format!("http://{addr}/ingest-events")).json(&sample_batch("dev-c", 1)).send().await.unwrap();
    assert_eq!(over_budget.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(over_budget.headers().get("retry-after").unwrap(), "60");
}

#[tokio::test]
async fn pattern_detector_requires_an_org_id() {
    let store = Store::open_in_memory().unwrap();
    let state = AppState::new(store, Arc::new(ScriptedLlmProvider::new()));
    let (addr, _server) = start_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/pattern-detector"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "MISSING_ORG");
}

#[tokio::test]
async fn ghost_executor_runs_an_approved_ghost_end_to_end() {
    let store = Store::open_in_memory().unwrap();
    let mut ghost = approved_ghost("org1", "server-smoke-test");
    ghost.execution_plan = vec![];
    let ghost_id = ghost.id;
    store.insert_ghost(&ghost).unwrap();
    let llm = ScriptedLlmProvider::new();
    llm.push_ok(canned_response(r#"[{"id":"s1","type":"action","action":{"tool":"human_escalation","params":{"reason":"demo"}}}]"#));
    let state = AppState::new(store, Arc::new(llm));
    let (addr, _server) = start_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/ghost-executor"))
        .json(&serde_json::json!({ "ghostId": ghost_id }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "completed");
}

#[tokio::test]
async fn ghost_executor_rejects_a_ghost_pending_approval() {
    let store = Store::open_in_memory().unwrap();
    let ghost = pending_ghost("org1", "not-yet-approved");
    let ghost_id = ghost.id;
    store.insert_ghost(&ghost).unwrap();
    let state = AppState::new(store, Arc::new(ScriptedLlmProvider::new()));
    let (addr, _server) = start_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/ghost-executor"))
        .json(&serde_json::json!({ "ghostId": ghost_id }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "GHOST_NOT_APPROVED");
}

#[tokio::test]
async fn approve_ghost_advances_state_and_version() {
    let store = Store::open_in_memory().unwrap();
    let ghost = pending_ghost("org1", "awaiting-review");
    let ghost_id = ghost.id;
    store.insert_ghost(&ghost).unwrap();
    let state = AppState::new(store, Arc::new(ScriptedLlmProvider::new()));
    let (addr, _server) = start_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/approve-ghost"))
        .json(&serde_json::json!({ "ghost_id": ghost_id, "action": "approve", "approved_by": "reviewer@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["new_status"], "approved");
    assert_eq!(body["data"]["version"], 2);
}

#[tokio::test]
async fn approve_ghost_reports_not_found_for_an_unknown_ghost() {
    let store = Store::open_in_memory().unwrap();
    let state = AppState::new(store, Arc::new(ScriptedLlmProvider::new()));
    let (addr, _server) = start_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/approve-ghost"))
        .json(&serde_json::json!({ "ghost_id": Uuid::new_v4(), "action": "approve" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
