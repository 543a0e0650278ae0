use std::sync::atomic::{AtomicU64, Ordering};

use refire_core::DispatchResult;
use serde::Serialize;

/// Atomic counters tracking the relay pipeline.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Transactions accepted into the queue.
    pub enqueued: AtomicU64,
    /// Transactions refused by the queue (full or closed).
    pub rejected: AtomicU64,
    /// Downstream calls attempted.
    pub dispatched: AtomicU64,
    /// Calls that produced an HTTP response, whatever its status.
    pub delivered: AtomicU64,
    /// Calls that failed on the wire.
    pub transport_failures: AtomicU64,
    /// Calls that failed for any other reason.
    pub unexpected_failures: AtomicU64,
}

impl WorkerMetrics {
    /// Increment the enqueued counter.
    pub fn increment_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the rejected counter.
    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one dispatch attempt and its outcome.
    pub fn record_dispatch(&self, result: &DispatchResult) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            DispatchResult::Delivered { .. } => &self.delivered,
            DispatchResult::TransportFailure { .. } => &self.transport_failures,
            DispatchResult::UnexpectedFailure { .. } => &self.unexpected_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> WorkerMetricsSnapshot {
        WorkerMetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            unexpected_failures: self.unexpected_failures.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`WorkerMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerMetricsSnapshot {
    pub enqueued: u64,
    pub rejected: u64,
    pub dispatched: u64,
    pub delivered: u64,
    pub transport_failures: u64,
    pub unexpected_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let snap = WorkerMetrics::default().snapshot();
        assert_eq!(snap.enqueued, 0);
        assert_eq!(snap.rejected, 0);
        assert_eq!(snap.dispatched, 0);
        assert_eq!(snap.delivered, 0);
        assert_eq!(snap.transport_failures, 0);
        assert_eq!(snap.unexpected_failures, 0);
    }

    #[test]
    fn record_dispatch_by_outcome() {
        let m = WorkerMetrics::default();
        m.record_dispatch(&DispatchResult::delivered(200));
        m.record_dispatch(&DispatchResult::delivered(500));
        m.record_dispatch(&DispatchResult::transport("timeout"));
        m.record_dispatch(&DispatchResult::unexpected("bad url"));

        let snap = m.snapshot();
        assert_eq!(snap.dispatched, 4);
        assert_eq!(snap.delivered, 2);
        assert_eq!(snap.transport_failures, 1);
        assert_eq!(snap.unexpected_failures, 1);
    }

    #[test]
    fn ingress_counters() {
        let m = WorkerMetrics::default();
        m.increment_enqueued();
        m.increment_enqueued();
        m.increment_rejected();

        let snap = m.snapshot();
        assert_eq!(snap.enqueued, 2);
        assert_eq!(snap.rejected, 1);
    }

    #[test]
    fn snapshot_serializes() {
        let json = serde_json::to_value(WorkerMetrics::default().snapshot()).unwrap();
        assert_eq!(json["transport_failures"], 0);
    }
}
