mod dispatch;
mod firefly;
mod server;
mod snapshot;
mod telemetry;


pub use dispatch::*;
pub use firefly::*;
pub use server::*;
pub use snapshot::*;
pub use telemetry::*;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use refire_core::TransactionId;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ServerError;

pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_FIREFLY_API_KEY: &str = "FIREFLY_API_KEY";
pub const ENV_WEBHOOK_ID: &str = "WEBHOOK_ID";
pub const ENV_COOLDOWN_SECONDS: &str = "COOLDOWN_SECONDS";
pub const ENV_MIN_SPACING_SECONDS: &str = "MIN_SPACING_SECONDS";
pub const ENV_COOLDOWN_ANCHOR: &str = "COOLDOWN_ANCHOR";

/// Top-level configuration for the refire server, loaded from a TOML file
/// and then overridden from the environment.
#[derive(Debug, Default, Deserialize)]
pub struct RefireConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Downstream ledger configuration.
    #[serde(default)]
    pub firefly: FireflySection,
    /// Pacing of downstream calls.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// OpenTelemetry distributed tracing configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RefireConfig {
    /// Load configuration from a TOML file. A missing file yields the
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ServerError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Unset and blank variables leave the current value alone. A value that
    /// does not parse is an error.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(host) = get(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.server.port = parse_env(ENV_PORT, &port)?;
        }
        if let Some(base_url) = get(ENV_API_BASE_URL) {
            self.firefly.base_url = base_url;
        }
        if let Some(api_key) = get(ENV_FIREFLY_API_KEY) {
            self.firefly.api_key = Some(SecretString::new(api_key));
        }
        if let Some(webhook_id) = get(ENV_WEBHOOK_ID) {
            self.firefly.webhook_id = webhook_id;
        }
        if let Some(cooldown) = get(ENV_COOLDOWN_SECONDS) {
            self.dispatch.cooldown_seconds = parse_env(ENV_COOLDOWN_SECONDS, &cooldown)?;
        }
        if let Some(spacing) = get(ENV_MIN_SPACING_SECONDS) {
            self.dispatch.min_spacing_seconds = parse_env(ENV_MIN_SPACING_SECONDS, &spacing)?;
        }
        if let Some(anchor) = get(ENV_COOLDOWN_ANCHOR) {
            self.dispatch.cooldown_anchor = parse_env(ENV_COOLDOWN_ANCHOR, &anchor)?;
        }
        Ok(())
    }

    /// Check the configuration for problems that do not prevent startup.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !self.firefly.dry_run {
            let has_key = self
                .firefly
                .api_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().is_empty());
            if !has_key {
                issues.push(ConfigIssue::error(
                    "firefly.api_key",
                    format!("{ENV_FIREFLY_API_KEY} is not set, triggers will be sent without credentials"),
                ));
            }
            if let Err(e) = self
                .firefly
                .to_dispatcher_config()
                .trigger_url(&TransactionId::new("0"))
            {
                issues.push(ConfigIssue::error("firefly.base_url", e.to_string()));
            }
        }

        if self.firefly.webhook_id.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "firefly.webhook_id",
                "webhook id is empty",
            ));
        }
        if self.firefly.request_timeout_seconds == Some(0) {
            issues.push(ConfigIssue::error(
                "firefly.request_timeout_seconds",
                "a zero timeout fails every trigger",
            ));
        }
        if self.dispatch.max_pending == Some(0) {
            issues.push(ConfigIssue::error(
                "dispatch.max_pending",
                "a zero capacity rejects every webhook",
            ));
        }
        if self.dispatch.min_spacing_seconds == 0 {
            issues.push(ConfigIssue::warning(
                "dispatch.min_spacing_seconds",
                "minimum spacing is zero, triggers are only serialised",
            ));
        }
        if !(0.0..=1.0).contains(&self.telemetry.sample_ratio) {
            issues.push(ConfigIssue::warning(
                "telemetry.sample_ratio",
                format!(
                    "sample ratio {} is outside 0.0..=1.0",
                    self.telemetry.sample_ratio
                ),
            ));
        }

        issues
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse()
        .map_err(|e| ServerError::Config(format!("invalid value `{raw}` for {key}: {e}")))
}

/// How serious a [`ConfigIssue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The service runs, but some or all triggers will not work.
    Error,
    /// Unusual but workable.
    Warning,
}

/// A problem found by [`RefireConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending setting.
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field,
            message: message.into(),
        }
    }

    /// Emit the issue at the matching log level.
    pub fn log(&self) {
        match self.severity {
            Severity::Error => tracing::error!(field = self.field, "{}", self.message),
            Severity::Warning => tracing::warn!(field = self.field, "{}", self.message),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
