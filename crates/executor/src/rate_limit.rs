//! Minimum spacing between consecutive downstream calls.

use std::time::Duration;

use tokio::time::Instant;

/// How long to wait before the next call is allowed.
///
/// Returns `max(0, min_spacing - (now - last_call))`. With no previous call
/// there is nothing to wait for.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use refire_executor::wait_duration;
///
/// let last = Instant::now();
/// let now = last + Duration::from_secs(10);
/// assert_eq!(
///     wait_duration(Some(last), now, Duration::from_secs(30)),
///     Duration::from_secs(20)
/// );
/// ```
pub fn wait_duration(last_call: Option<Instant>, now: Instant, min_spacing: Duration) -> Duration {
    match last_call {
        Some(last) => min_spacing.saturating_sub(now.saturating_duration_since(last)),
        None => Duration::ZERO,
    }
}

/// The worker-owned "time of last downstream call".
///
/// Only the worker reads or writes it, so it needs no synchronisation.
#[derive(Debug, Clone)]
pub struct RateGate {
    min_spacing: Duration,
    last_call: Option<Instant>,
}

impl RateGate {
    /// Create a gate that has not seen any call yet.
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_call: None,
        }
    }

    /// Time still to wait at `now` before the next call.
    pub fn remaining(&self, now: Instant) -> Duration {
        wait_duration(self.last_call, now, self.min_spacing)
    }

    /// Record a call attempt, successful or not.
    pub fn record(&mut self, at: Instant) {
        self.last_call = Some(at);
    }

    /// When the last call was recorded.
    pub fn last_call(&self) -> Option<Instant> {
        self.last_call
    }
}
