pub mod config;
pub mod metrics;
pub mod queue;
pub mod rate_limit;
pub mod worker;

pub use config::{CooldownAnchor, WorkerConfig};
pub use metrics::{WorkerMetrics, WorkerMetricsSnapshot};
pub use queue::{DelayQueue, EnqueueError, QueueEntry};
pub use rate_limit::{RateGate, wait_duration};
pub use worker::{SequentialWorker, WorkerHandle, WorkerState};

// Re-exported so callers can drive shutdown without a direct dependency.
pub use tokio_util::sync::CancellationToken;
