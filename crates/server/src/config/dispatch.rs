use std::time::Duration;

use refire_executor::{CooldownAnchor, WorkerConfig};
use serde::Deserialize;

/// Pacing of downstream calls.
///
/// # Example
///
/// ```toml
/// [dispatch]
/// cooldown_seconds = 120
/// min_spacing_seconds = 30
/// cooldown_anchor = "after_dequeue"
/// max_pending = 10000
/// ```
#[derive(Debug, Deserialize)]
pub struct DispatchConfig {
    /// Delay imposed on every transaction before it is triggered.
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,
    /// Minimum gap between the end of one trigger and the start of the next.
    #[serde(default = "default_min_spacing")]
    pub min_spacing_seconds: u64,
    /// What the cooldown is measured from.
    #[serde(default)]
    pub cooldown_anchor: CooldownAnchor,
    /// Queue capacity. Unset means unbounded.
    #[serde(default)]
    pub max_pending: Option<usize>,
}

impl DispatchConfig {
    /// Build the worker timing configuration.
    pub fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            cooldown: Duration::from_secs(self.cooldown_seconds),
            min_spacing: Duration::from_secs(self.min_spacing_seconds),
            cooldown_anchor: self.cooldown_anchor,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown(),
            min_spacing_seconds: default_min_spacing(),
            cooldown_anchor: CooldownAnchor::default(),
            max_pending: None,
        }
    }
}

fn default_cooldown() -> u64 {
    120
}

fn default_min_spacing() -> u64 {
    30
}
