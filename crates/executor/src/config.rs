use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// What the cooldown of an entry is measured from.
///
/// The two anchors behave identically while the queue never backs up. Once
/// entries wait behind each other they diverge: `AfterDequeue` adds the full
/// cooldown to every entry regardless of how long it already queued, while
/// `Enqueue` only waits out whatever is left of `enqueued_at + cooldown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownAnchor {
    /// Sleep for the full cooldown after taking the entry off the queue.
    #[default]
    AfterDequeue,
    /// Wait until the entry's enqueue time plus the cooldown.
    Enqueue,
}

impl CooldownAnchor {
    /// Returns the anchor name as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterDequeue => "after_dequeue",
            Self::Enqueue => "enqueue",
        }
    }
}

impl fmt::Display for CooldownAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CooldownAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "after_dequeue" | "dequeue" => Ok(Self::AfterDequeue),
            "enqueue" => Ok(Self::Enqueue),
            other => Err(format!(
                "unknown cooldown anchor `{other}` (expected `after_dequeue` or `enqueue`)"
            )),
        }
    }
}

/// Timing configuration for the [`SequentialWorker`](crate::SequentialWorker).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use refire_executor::WorkerConfig;
///
/// let config = WorkerConfig::default();
/// assert_eq!(config.cooldown, Duration::from_secs(120));
/// assert_eq!(config.min_spacing, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Wait imposed on each transaction before its dispatch.
    pub cooldown: Duration,
    /// Minimum time between the end of one dispatch and the next one.
    pub min_spacing: Duration,
    /// What the cooldown is measured from.
    pub cooldown_anchor: CooldownAnchor,
}

impl WorkerConfig {
    /// How long an entry dequeued at `now` still has to cool down.
    pub fn cooldown_remaining(&self, enqueued_at: Instant, now: Instant) -> Duration {
        match self.cooldown_anchor {
            CooldownAnchor::AfterDequeue => self.cooldown,
            CooldownAnchor::Enqueue => (enqueued_at + self.cooldown).saturating_duration_since(now),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(120),
            min_spacing: Duration::from_secs(30),
            cooldown_anchor: CooldownAnchor::AfterDequeue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.cooldown, Duration::from_secs(120));
        assert_eq!(cfg.min_spacing, Duration::from_secs(30));
        assert_eq!(cfg.cooldown_anchor, CooldownAnchor::AfterDequeue);
    }

    #[test]
    fn after_dequeue_ignores_queue_time() {
        let cfg = WorkerConfig::default();
        let enqueued = Instant::now();
        let now = enqueued + Duration::from_secs(500);
        assert_eq!(cfg.cooldown_remaining(enqueued, now), Duration::from_secs(120));
    }

    #[test]
    fn enqueue_anchor_subtracts_queue_time() {
        let cfg = WorkerConfig {
            cooldown_anchor: CooldownAnchor::Enqueue,
            ..WorkerConfig::default()
        };
        let enqueued = Instant::now();
        assert_eq!(
            cfg.cooldown_remaining(enqueued, enqueued + Duration::from_secs(20)),
            Duration::from_secs(100)
        );
        assert_eq!(
            cfg.cooldown_remaining(enqueued, enqueued + Duration::from_secs(300)),
            Duration::ZERO
        );
    }

    #[test]
    fn anchor_parsing() {
        assert_eq!(
            "after_dequeue".parse::<CooldownAnchor>().unwrap(),
            CooldownAnchor::AfterDequeue
        );
        assert_eq!(
            " Enqueue ".parse::<CooldownAnchor>().unwrap(),
            CooldownAnchor::Enqueue
        );
        assert!("sometime".parse::<CooldownAnchor>().is_err());
    }

    #[test]
    fn anchor_serde_names() {
        let json = serde_json::to_string(&CooldownAnchor::AfterDequeue).unwrap();
        assert_eq!(json, "\"after_dequeue\"");
        let back: CooldownAnchor = serde_json::from_str("\"enqueue\"").unwrap();
        assert_eq!(back, CooldownAnchor::Enqueue);
    }
}
