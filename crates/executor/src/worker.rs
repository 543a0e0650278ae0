//! The single consumer of the [`DelayQueue`].
//!
//! One worker runs per process. It takes one transaction at a time through
//! `WaitingForItem -> CoolingDown -> RateGated -> Dispatching` and back, so
//! at most one downstream call is ever in flight and the spacing between
//! calls follows from the serialisation alone.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use refire_core::{DispatchResult, TransactionId};
use refire_provider::DynDispatcher;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::metrics::WorkerMetrics;
use crate::queue::DelayQueue;
use crate::rate_limit::RateGate;

/// Where the worker currently is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Blocked on the queue.
    WaitingForItem,
    /// Holding a transaction until its cooldown has passed.
    CoolingDown,
    /// Holding a transaction until the minimum spacing has passed.
    RateGated,
    /// Waiting for the downstream call to return.
    Dispatching,
    /// Shut down; no further transactions are processed.
    Stopped,
}

impl WorkerState {
    /// Returns the state name as reported in logs and health output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForItem => "waiting_for_item",
            Self::CoolingDown => "cooling_down",
            Self::RateGated => "rate_gated",
            Self::Dispatching => "dispatching",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drains the queue, applies cooldown and spacing, and dispatches.
pub struct SequentialWorker {
    queue: Arc<DelayQueue>,
    dispatcher: Arc<dyn DynDispatcher>,
    config: WorkerConfig,
    metrics: Arc<WorkerMetrics>,
    gate: RateGate,
    state_tx: watch::Sender<WorkerState>,
}

impl SequentialWorker {
    /// Create a worker over the given queue and dispatcher.
    pub fn new(
        queue: Arc<DelayQueue>,
        dispatcher: Arc<dyn DynDispatcher>,
        config: WorkerConfig,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkerState::WaitingForItem);
        Self {
            queue,
            dispatcher,
            gate: RateGate::new(config.min_spacing),
            config,
            metrics,
            state_tx,
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state_tx.subscribe()
    }

    /// Run the worker on its own task until `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> WorkerHandle {
        let state = self.subscribe();
        let join = tokio::spawn(self.run(shutdown));
        WorkerHandle { state, join }
    }

    /// Process transactions until `shutdown` is cancelled or the queue is
    /// closed.
    ///
    /// Cancellation interrupts a wait for an item, a cooldown, or a rate
    /// gate; the transaction being held is dropped. A downstream call that
    /// is already in flight is allowed to finish. A dispatcher that panics
    /// is reported as an unexpected failure and the loop carries on. On
    /// exit the queue is closed and whatever is still waiting in it is
    /// discarded.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            dispatcher = %self.dispatcher.name(),
            cooldown_ms = millis(self.config.cooldown),
            min_spacing_ms = millis(self.config.min_spacing),
            cooldown_anchor = %self.config.cooldown_anchor,
            "sequential worker started"
        );

        loop {
            self.transition(WorkerState::WaitingForItem, None);
            let entry = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                entry = self.queue.dequeue() => match entry {
                    Some(entry) => entry,
                    None => break,
                },
            };
            let id = entry.id;

            let cooldown = self
                .config
                .cooldown_remaining(entry.enqueued_at, Instant::now());
            self.transition(WorkerState::CoolingDown, Some(&id));
            info!(
                transaction_id = %id,
                wait_ms = millis(cooldown),
                queued_ms = millis(entry.enqueued_at.elapsed()),
                "cooling down before dispatch"
            );
            if !pause(cooldown, &shutdown).await {
                warn!(transaction_id = %id, "shutdown during cooldown, transaction dropped");
                break;
            }

            let gate_wait = self.gate.remaining(Instant::now());
            self.transition(WorkerState::RateGated, Some(&id));
            if !gate_wait.is_zero() {
                info!(
                    transaction_id = %id,
                    wait_ms = millis(gate_wait),
                    "waiting for minimum spacing"
                );
            }
            if !pause(gate_wait, &shutdown).await {
                warn!(transaction_id = %id, "shutdown during rate gate, transaction dropped");
                break;
            }

            self.transition(WorkerState::Dispatching, Some(&id));
            info!(transaction_id = %id, "dispatching trigger");
            let result = AssertUnwindSafe(self.dispatcher.dispatch(&id))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let reason = format!("dispatcher panicked: {}", panic_message(&*panic));
                    error!(transaction_id = %id, reason = %reason, "dispatcher panicked");
                    DispatchResult::unexpected(reason)
                });
            self.gate.record(Instant::now());
            self.metrics.record_dispatch(&result);
            log_result(&id, &result);
        }

        let dropped = self.queue.close();
        self.transition(WorkerState::Stopped, None);
        info!(dropped, "sequential worker stopped");
    }

    fn transition(&self, state: WorkerState, id: Option<&TransactionId>) {
        self.state_tx.send_replace(state);
        match id {
            Some(id) => info!(state = %state, transaction_id = %id, "worker state"),
            None => info!(state = %state, "worker state"),
        }
    }
}

/// Handle to a spawned [`SequentialWorker`].
pub struct WorkerHandle {
    state: watch::Receiver<WorkerState>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// The worker's current state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// A receiver that follows the worker's state.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    /// Wait for the worker task to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.join.await
    }
}

/// Sleep for `duration` unless `shutdown` fires first. Returns `false` when
/// interrupted.
async fn pause(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = shutdown.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

fn log_result(id: &TransactionId, result: &DispatchResult) {
    match result {
        DispatchResult::Delivered { status } => {
            info!(transaction_id = %id, status, outcome = result.kind(), "trigger delivered");
        }
        DispatchResult::TransportFailure { reason } => {
            warn!(transaction_id = %id, reason = %reason, outcome = result.kind(), "trigger failed, not retrying");
        }
        DispatchResult::UnexpectedFailure { reason } => {
            warn!(transaction_id = %id, reason = %reason, outcome = result.kind(), "trigger failed, not retrying");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
