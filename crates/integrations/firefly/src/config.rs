use std::time::Duration;

use refire_core::TransactionId;
use secrecy::{ExposeSecret, SecretString};

use crate::error::FireflyError;

/// Default ledger host, the public Firefly III demo.
pub const DEFAULT_BASE_URL: &str = "https://demo.firefly-iii.org";

/// Default webhook whose trigger endpoint is called.
pub const DEFAULT_WEBHOOK_ID: &str = "1";

/// Configuration for the Firefly III dispatcher.
#[derive(Clone)]
pub struct FireflyConfig {
    /// Base URL of the ledger, optionally with a path prefix.
    pub base_url: String,

    /// Identifier of the webhook to trigger.
    pub webhook_id: String,

    /// Personal access token sent as a bearer credential.
    pub api_key: Option<SecretString>,

    /// Whole-request timeout. `None` means the call may take as long as
    /// the ledger needs.
    pub request_timeout: Option<Duration>,
}

impl FireflyConfig {
    /// Create a configuration for the given ledger.
    ///
    /// Defaults to webhook `"1"`, no credential and no request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            webhook_id: DEFAULT_WEBHOOK_ID.to_owned(),
            api_key: None,
            request_timeout: None,
        }
    }

    /// Set the webhook identifier.
    #[must_use]
    pub fn with_webhook_id(mut self, webhook_id: impl Into<String>) -> Self {
        self.webhook_id = webhook_id.into();
        self
    }

    /// Set the bearer credential.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Whether a non-empty credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    /// Build `{base}/api/v1/webhooks/{webhook_id}/trigger-transaction/{id}`.
    ///
    /// Path segments are percent-encoded, so an id can never escape its
    /// segment. A trailing slash on the base URL is ignored.
    pub fn trigger_url(&self, id: &TransactionId) -> Result<reqwest::Url, FireflyError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| FireflyError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| {
                FireflyError::InvalidUrl(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend([
                "api",
                "v1",
                "webhooks",
                self.webhook_id.as_str(),
                "trigger-transaction",
                id.as_str(),
            ]);
        Ok(url)
    }
}

impl std::fmt::Debug for FireflyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FireflyConfig")
            .field("base_url", &self.base_url)
            .field("webhook_id", &self.webhook_id)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
