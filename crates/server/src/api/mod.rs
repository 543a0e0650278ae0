pub mod health;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use refire_executor::{DelayQueue, WorkerMetrics, WorkerState};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Queue feeding the sequential worker.
    pub queue: Arc<DelayQueue>,
    /// Counters shared with the worker.
    pub metrics: Arc<WorkerMetrics>,
    /// Follows the worker's state for health reporting.
    pub worker_state: watch::Receiver<WorkerState>,
}

/// Build the Axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::receive))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
