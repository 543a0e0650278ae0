use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use refire_executor::{WorkerMetricsSnapshot, WorkerState};

use super::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub worker_state: WorkerState,
    pub queue_depth: usize,
    pub metrics: WorkerMetricsSnapshot,
}

/// `GET /health` -- service status, worker state and queue depth.
///
/// Always answers 200 while the listener is up; a stopped worker shows up
/// in `worker_state`.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "ok",
        worker_state: *state.worker_state.borrow(),
        queue_depth: state.queue.len(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(body))
}

/// `GET /metrics` -- worker counters as JSON.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.metrics.snapshot()))
}
