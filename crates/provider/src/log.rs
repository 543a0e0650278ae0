use refire_core::{DispatchResult, TransactionId};
use tracing::info;

use crate::dispatcher::Dispatcher;

/// A dispatcher that logs the trigger and reports delivery without
/// performing any external I/O.
///
/// Useful for local development and dry runs where you don't have (or
/// don't want to hit) a real ledger.
pub struct LogDispatcher {
    name: String,
}

impl LogDispatcher {
    /// Create a new `LogDispatcher` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Dispatcher for LogDispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn dispatch(&self, id: &TransactionId) -> DispatchResult {
        info!(
            dispatcher = %self.name,
            transaction_id = %id,
            "log dispatcher triggered transaction"
        );
        DispatchResult::delivered(200)
    }
}
