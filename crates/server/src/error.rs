use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use refire_core::MalformedEvent;
use refire_executor::EnqueueError;
use thiserror::Error;

/// Errors that can occur when running the refire server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The webhook message did not carry a usable transaction id.
    #[error("{0}")]
    Malformed(#[from] MalformedEvent),

    /// The queue refused the transaction.
    #[error("{0}")]
    Enqueue(#[from] EnqueueError),
}

impl ServerError {
    /// HTTP status reported to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Enqueue(EnqueueError::Full { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Enqueue(EnqueueError::Closed) | Self::Config(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "status": "error", "message": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
