use refire_core::{DispatchResult, TransactionId};
use refire_provider::{Dispatcher, inject_trace_context};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use crate::config::FireflyConfig;
use crate::error::FireflyError;

/// Calls the ledger's trigger-transaction endpoint once per transaction.
///
/// Any HTTP status counts as delivered; only failures to obtain a response
/// are reported as failures. Nothing is retried.
pub struct FireflyDispatcher {
    config: FireflyConfig,
    client: Client,
}

impl FireflyDispatcher {
    /// Create a dispatcher with a client built from the configuration.
    pub fn new(config: FireflyConfig) -> Result<Self, FireflyError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FireflyError::Client(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a dispatcher with a custom HTTP client.
    ///
    /// The configured request timeout is ignored; the client's own settings
    /// apply.
    pub fn with_client(config: FireflyConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Return the dispatcher configuration.
    pub fn config(&self) -> &FireflyConfig {
        &self.config
    }

    async fn trigger(&self, id: &TransactionId) -> Result<u16, FireflyError> {
        let url = self.config.trigger_url(id)?;
        debug!(url = %url, "triggering transaction");

        let mut request = self
            .client
            .post(url)
            .header(ACCEPT, "*/*")
            .header(CONTENT_TYPE, "application/json")
            .body("{}");

        match &self.config.api_key {
            Some(key) if !key.expose_secret().is_empty() => {
                request = request.bearer_auth(key.expose_secret());
            }
            _ => warn!("no API credential configured, sending unauthenticated trigger"),
        }

        let response = inject_trace_context(request).send().await?;
        let status = response.status().as_u16();

        // The body is informational only; failing to read it does not undo
        // the delivery.
        match response.text().await {
            Ok(body) => debug!(status, body = %body, "trigger response"),
            Err(e) => debug!(status, error = %e, "trigger response body unreadable"),
        }

        Ok(status)
    }
}

impl Dispatcher for FireflyDispatcher {
    fn name(&self) -> &str {
        "firefly"
    }

    #[instrument(skip(self), fields(transaction_id = %id, webhook_id = %self.config.webhook_id))]
    async fn dispatch(&self, id: &TransactionId) -> DispatchResult {
        match self.trigger(id).await {
            Ok(status) => DispatchResult::delivered(status),
            Err(e) => e.into(),
        }
    }
}
