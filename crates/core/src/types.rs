use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::MalformedEvent;

/// Identifies one transaction in the downstream ledger.
///
/// The value is opaque: it is extracted once at ingress and carried through
/// the queue unchanged. Uniqueness is not enforced, so two enqueues of the
/// same id produce two independent dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a new id from a string value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the inner string as a str slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build an id from a JSON value.
    ///
    /// Strings are trimmed and must be non-empty; integers are rendered in
    /// decimal. Every other JSON type is rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, MalformedEvent> {
        match value {
            serde_json::Value::String(s) => s.parse(),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Self(n.to_string())),
            other => Err(MalformedEvent::InvalidId(format!(
                "expected a string or integer, got {}",
                json_type_name(other)
            ))),
        }
    }
}

impl FromStr for TransactionId {
    type Err = MalformedEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MalformedEvent::InvalidId("id is empty".into()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "non-integer number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
