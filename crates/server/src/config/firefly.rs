use std::time::Duration;

use refire_firefly::FireflyConfig;
use refire_firefly::config::{DEFAULT_BASE_URL, DEFAULT_WEBHOOK_ID};
use secrecy::SecretString;
use serde::Deserialize;

/// Downstream ledger configuration.
///
/// # Example
///
/// ```toml
/// [firefly]
/// base_url = "https://firefly.example.com"
/// webhook_id = "3"
/// request_timeout_seconds = 30
/// ```
///
/// The credential is normally supplied through `FIREFLY_API_KEY` rather
/// than written to the file.
#[derive(Debug, Deserialize)]
pub struct FireflySection {
    /// Base URL of the ledger.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Personal access token sent as a bearer credential.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Identifier of the webhook to trigger.
    #[serde(default = "default_webhook_id")]
    pub webhook_id: String,
    /// Whole-request timeout for trigger calls. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
    /// Log triggers instead of calling the ledger.
    #[serde(default)]
    pub dry_run: bool,
}

impl FireflySection {
    /// Build the dispatcher configuration.
    pub fn to_dispatcher_config(&self) -> FireflyConfig {
        FireflyConfig {
            base_url: self.base_url.clone(),
            webhook_id: self.webhook_id.clone(),
            api_key: self.api_key.clone(),
            request_timeout: self.request_timeout_seconds.map(Duration::from_secs),
        }
    }
}

impl Default for FireflySection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            webhook_id: default_webhook_id(),
            request_timeout_seconds: None,
            dry_run: false,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_webhook_id() -> String {
    DEFAULT_WEBHOOK_ID.to_owned()
}
