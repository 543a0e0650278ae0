use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tower::ServiceExt;

use refire_core::{DispatchResult, TransactionId};
use refire_executor::{
    CancellationToken, CooldownAnchor, DelayQueue, SequentialWorker, WorkerConfig, WorkerMetrics,
    WorkerState,
};
use refire_provider::Dispatcher;
use refire_server::api::AppState;

// -- Mock dispatcher ------------------------------------------------------

struct ChannelDispatcher {
    calls: mpsc::UnboundedSender<(TransactionId, Instant)>,
}

impl Dispatcher for ChannelDispatcher {
    fn name(&self) -> &str {
        "channel"
    }

    async fn dispatch(&self, id: &TransactionId) -> DispatchResult {
        let _ = self.calls.send((id.clone(), Instant::now()));
        DispatchResult::delivered(204)
    }
}

// -- Helpers --------------------------------------------------------------

fn build_test_state(queue: DelayQueue) -> AppState {
    let (_tx, rx) = watch::channel(WorkerState::WaitingForItem);
    AppState {
        queue: Arc::new(queue),
        metrics: Arc::new(WorkerMetrics::default()),
        worker_state: rx,
    }
}

fn build_app(state: AppState) -> axum::Router {
    refire_server::api::router(state)
}

fn webhook_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri("/webhook")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn ledger_message(id: serde_json::Value) -> String {
    serde_json::json!({
        "uuid": "0d3b7f0e-5c7a-4bd7-9a7e-1f0b6f3d2c11",
        "user": 1,
        "trigger": "STORE_TRANSACTION",
        "response": "TRANSACTIONS",
        "content": {"id": id, "transactions": []}
    })
    .to_string()
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn webhook_accepts_and_queues() {
    let state = build_test_state(DelayQueue::unbounded());
    let queue = Arc::clone(&state.queue);
    let metrics = Arc::clone(&state.metrics);
    let app = build_app(state);

    let (status, json) = send(&app, webhook_request(ledger_message(4711.into()))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "received");
    assert_eq!(json["transaction_id"], "4711");
    assert_eq!(queue.len(), 1);
    assert_eq!(metrics.snapshot().enqueued, 1);
}

#[tokio::test]
async fn webhook_accepts_string_ids_and_duplicates() {
    let state = build_test_state(DelayQueue::unbounded());
    let queue = Arc::clone(&state.queue);
    let app = build_app(state);

    for _ in 0..2 {
        let (status, json) = send(&app, webhook_request(ledger_message("88".into()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["transaction_id"], "88");
    }
    assert_eq!(queue.len(), 2);
}

#[tokio::test]
async fn webhook_without_content_id_is_400() {
    let state = build_test_state(DelayQueue::unbounded());
    let queue = Arc::clone(&state.queue);
    let app = build_app(state);

    let (status, json) = send(&app, webhook_request("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("content"));

    let (status, _) = send(&app, webhook_request(r#"{"content": {"user": 1}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(queue.is_empty());
}

#[tokio::test]
async fn webhook_invalid_json_is_400() {
    let state = build_test_state(DelayQueue::unbounded());
    let queue = Arc::clone(&state.queue);
    let app = build_app(state);

    let (status, json) = send(&app, webhook_request("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert!(queue.is_empty());
}

#[tokio::test]
async fn webhook_full_queue_is_503() {
    let state = build_test_state(DelayQueue::bounded(1));
    let queue = Arc::clone(&state.queue);
    let metrics = Arc::clone(&state.metrics);
    let app = build_app(state);

    let (status, _) = send(&app, webhook_request(ledger_message(1.into()))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, webhook_request(ledger_message(2.into()))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "error");

    // The queued entry survives; the new one is the one refused.
    assert_eq!(queue.len(), 1);
    let snap = metrics.snapshot();
    assert_eq!(snap.enqueued, 1);
    assert_eq!(snap.rejected, 1);
}

#[tokio::test]
async fn webhook_after_shutdown_is_500() {
    let state = build_test_state(DelayQueue::unbounded());
    state.queue.close();
    let app = build_app(state);

    let (status, json) = send(&app, webhook_request(ledger_message(1.into()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "queue is closed");
}

#[tokio::test]
async fn health_reports_worker_and_queue() {
    let state = build_test_state(DelayQueue::unbounded());
    state.queue.enqueue(TransactionId::new("5")).unwrap();
    let app = build_app(state);

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["worker_state"], "waiting_for_item");
    assert_eq!(json["queue_depth"], 1);
    assert!(json["metrics"].is_object());
}

#[tokio::test]
async fn metrics_returns_200() {
    let app = build_app(build_test_state(DelayQueue::unbounded()));

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dispatched"], 0);
    assert_eq!(json["enqueued"], 0);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = build_app(build_test_state(DelayQueue::unbounded()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn webhooks_are_triggered_after_cooldown() {
    let (tx, mut calls) = mpsc::unbounded_channel();
    let queue = Arc::new(DelayQueue::unbounded());
    let metrics = Arc::new(WorkerMetrics::default());
    let shutdown = CancellationToken::new();
    let worker = SequentialWorker::new(
        Arc::clone(&queue),
        Arc::new(ChannelDispatcher { calls: tx }),
        WorkerConfig {
            cooldown: Duration::from_secs(120),
            min_spacing: Duration::from_secs(30),
            cooldown_anchor: CooldownAnchor::Enqueue,
        },
        Arc::clone(&metrics),
    )
    .spawn(shutdown.clone());

    let app = build_app(AppState {
        queue: Arc::clone(&queue),
        metrics: Arc::clone(&metrics),
        worker_state: worker.subscribe(),
    });
    let start = Instant::now();

    let (status, _) = send(&app, webhook_request(ledger_message("A".into()))).await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_secs(1)).await;
    let (status, _) = send(&app, webhook_request(ledger_message("B".into()))).await;
    assert_eq!(status, StatusCode::OK);

    let (a, at_a) = calls.recv().await.unwrap();
    let (b, at_b) = calls.recv().await.unwrap();
    assert_eq!(a.as_str(), "A");
    assert_eq!(b.as_str(), "B");
    assert!(at_a - start >= Duration::from_secs(120));
    assert!(at_b - start >= Duration::from_secs(150));
    assert!(at_b - at_a >= Duration::from_secs(30));

    let (_, json) = send(
        &app,
        Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(json["enqueued"], 2);

    shutdown.cancel();
    worker.join().await.unwrap();
    assert_eq!(metrics.snapshot().delivered, 2);

    let (status, _) = send(&app, webhook_request(ledger_message("C".into()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
