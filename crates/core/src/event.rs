//! Extraction of the transaction id from an inbound webhook message.
//!
//! The ledger posts messages shaped like
//! `{"uuid": "...", "trigger": "STORE_TRANSACTION", "content": {"id": 4711, ...}}`.
//! Only `content.id` matters here; everything else is ignored.

use thiserror::Error;

use crate::types::TransactionId;

/// Reasons an inbound message cannot be turned into a [`TransactionId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    /// The request body was not valid JSON.
    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),

    /// The message root is not a JSON object.
    #[error("message is not a JSON object")]
    NotAnObject,

    /// The message has no `content` object.
    #[error("message has no `content` object")]
    MissingContent,

    /// `content` has no `id` field.
    #[error("message has no `content.id` field")]
    MissingId,

    /// `content.id` is present but unusable.
    #[error("invalid transaction id: {0}")]
    InvalidId(String),
}

/// Read `content.id` from a webhook message.
pub fn extract_transaction_id(message: &serde_json::Value) -> Result<TransactionId, MalformedEvent> {
    let root = message.as_object().ok_or(MalformedEvent::NotAnObject)?;
    let content = root
        .get("content")
        .and_then(serde_json::Value::as_object)
        .ok_or(MalformedEvent::MissingContent)?;
    let id = content.get("id").ok_or(MalformedEvent::MissingId)?;
    TransactionId::from_json(id)
}

/// Parse a raw request body and extract the transaction id.
pub fn extract_from_slice(body: &[u8]) -> Result<TransactionId, MalformedEvent> {
    let message: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| MalformedEvent::InvalidJson(e.to_string()))?;
    extract_transaction_id(&message)
}
