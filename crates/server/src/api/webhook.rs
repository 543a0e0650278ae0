use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::{debug, info, warn};

use refire_core::{TransactionId, extract_from_slice};
use refire_executor::EnqueueError;

use crate::error::ServerError;

use super::AppState;

/// Body returned for an accepted webhook.
#[derive(Debug, Serialize)]
pub struct Received {
    pub status: &'static str,
    pub transaction_id: TransactionId,
}

/// `POST /webhook` -- accept a ledger webhook and queue its transaction.
///
/// Responds as soon as the transaction is queued; the trigger happens
/// later on the worker. The body is read raw so that unparsable JSON gets
/// the same error shape as a message without `content.id`.
pub async fn receive(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
    debug!(message = %String::from_utf8_lossy(&body), "received webhook message");

    let id = extract_from_slice(&body).inspect_err(|e| {
        warn!(error = %e, "rejecting webhook message");
    })?;

    match state.queue.enqueue(id.clone()) {
        Ok(depth) => {
            state.metrics.increment_enqueued();
            info!(transaction_id = %id, queue_depth = depth, "transaction queued");
            Ok((
                StatusCode::OK,
                Json(Received {
                    status: "received",
                    transaction_id: id,
                }),
            ))
        }
        Err(e) => {
            state.metrics.increment_rejected();
            match &e {
                EnqueueError::Full { capacity } => {
                    warn!(transaction_id = %id, capacity, "queue full, transaction rejected");
                }
                EnqueueError::Closed => {
                    warn!(transaction_id = %id, "queue closed, transaction rejected");
                }
            }
            Err(e.into())
        }
    }
}
