use serde::{Deserialize, Serialize};

/// Classified result of a single downstream trigger attempt.
///
/// Every variant is terminal for the transaction: nothing is retried and
/// nothing is re-enqueued. The HTTP status of a [`Delivered`](Self::Delivered)
/// call is recorded but never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchResult {
    /// The request completed and the downstream answered with `status`.
    Delivered { status: u16 },
    /// The request never produced a response (timeout, refused, DNS, TLS).
    TransportFailure { reason: String },
    /// Anything else went wrong while building or sending the request.
    UnexpectedFailure { reason: String },
}

impl DispatchResult {
    /// Create a delivered result with the given HTTP status.
    pub fn delivered(status: u16) -> Self {
        Self::Delivered { status }
    }

    /// Create a transport failure.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::TransportFailure {
            reason: reason.into(),
        }
    }

    /// Create an unexpected failure.
    pub fn unexpected(reason: impl Into<String>) -> Self {
        Self::UnexpectedFailure {
            reason: reason.into(),
        }
    }

    /// Returns `true` when the downstream produced a response.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// HTTP status of a delivered call.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Delivered { status } => Some(*status),
            _ => None,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::TransportFailure { .. } => "transport_failure",
            Self::UnexpectedFailure { .. } => "unexpected_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_accessors() {
        let result = DispatchResult::delivered(404);
        assert!(result.is_delivered());
        assert_eq!(result.status(), Some(404));
        assert_eq!(result.kind(), "delivered");
    }

    #[test]
    fn failures_have_no_status() {
        let transport = DispatchResult::transport("connection refused");
        assert!(!transport.is_delivered());
        assert_eq!(transport.status(), None);
        assert_eq!(transport.kind(), "transport_failure");

        let unexpected = DispatchResult::unexpected("bad url");
        assert_eq!(unexpected.status(), None);
        assert_eq!(unexpected.kind(), "unexpected_failure");
    }

    #[test]
    fn serializes_with_outcome_tag() {
        let json = serde_json::to_value(DispatchResult::delivered(200)).unwrap();
        assert_eq!(json["outcome"], "delivered");
        assert_eq!(json["status"], 200);

        let json = serde_json::to_value(DispatchResult::transport("timed out")).unwrap();
        assert_eq!(json["outcome"], "transport_failure");
        assert_eq!(json["reason"], "timed out");
    }
}
