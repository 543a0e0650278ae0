use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::info;

use super::{DispatchConfig, FireflySection, RefireConfig, ServerConfig, TelemetryConfig};

/// Shown in place of a configured credential.
pub const MASKED: &str = "********";

/// Shown when no credential is configured.
pub const NOT_SET: &str = "Not Set";

/// Sanitized view of the full server configuration.
///
/// The credential is masked so that the snapshot is safe to log.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub server: ServerSnapshot,
    pub firefly: FireflySnapshot,
    pub dispatch: DispatchSnapshot,
    pub telemetry: TelemetrySnapshot,
}

impl ConfigSnapshot {
    /// Log the effective configuration at info level.
    pub fn log_summary(&self) {
        info!(
            host = %self.server.host,
            port = self.server.port,
            shutdown_timeout_seconds = self.server.shutdown_timeout_seconds,
            "server configuration"
        );
        info!(
            api_base_url = %self.firefly.base_url,
            firefly_api_key = %self.firefly.api_key,
            webhook_id = %self.firefly.webhook_id,
            request_timeout_seconds = ?self.firefly.request_timeout_seconds,
            dry_run = self.firefly.dry_run,
            "ledger configuration"
        );
        info!(
            cooldown_seconds = self.dispatch.cooldown_seconds,
            min_spacing_seconds = self.dispatch.min_spacing_seconds,
            cooldown_anchor = %self.dispatch.cooldown_anchor,
            max_pending = ?self.dispatch.max_pending,
            "dispatch configuration"
        );
        info!(
            log_filter = %self.telemetry.log_filter,
            otlp_enabled = self.telemetry.enabled,
            otlp_endpoint = %self.telemetry.endpoint,
            otlp_protocol = %self.telemetry.protocol,
            service_name = %self.telemetry.service_name,
            sample_ratio = self.telemetry.sample_ratio,
            "telemetry configuration"
        );
    }
}

impl From<&RefireConfig> for ConfigSnapshot {
    fn from(cfg: &RefireConfig) -> Self {
        Self {
            server: ServerSnapshot::from(&cfg.server),
            firefly: FireflySnapshot::from(&cfg.firefly),
            dispatch: DispatchSnapshot::from(&cfg.dispatch),
            telemetry: TelemetrySnapshot::from(&cfg.telemetry),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerSnapshot {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_seconds: u64,
}

impl From<&ServerConfig> for ServerSnapshot {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
            shutdown_timeout_seconds: cfg.shutdown_timeout_seconds,
        }
    }
}

/// Sanitized ledger configuration (credential masked).
#[derive(Debug, Clone, Serialize)]
pub struct FireflySnapshot {
    pub base_url: String,
    /// [`MASKED`] when a credential is configured, [`NOT_SET`] otherwise.
    pub api_key: String,
    pub webhook_id: String,
    pub request_timeout_seconds: Option<u64>,
    pub dry_run: bool,
}

impl From<&FireflySection> for FireflySnapshot {
    fn from(cfg: &FireflySection) -> Self {
        let has_key = cfg
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty());
        Self {
            base_url: cfg.base_url.clone(),
            api_key: if has_key { MASKED } else { NOT_SET }.to_owned(),
            webhook_id: cfg.webhook_id.clone(),
            request_timeout_seconds: cfg.request_timeout_seconds,
            dry_run: cfg.dry_run,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchSnapshot {
    pub cooldown_seconds: u64,
    pub min_spacing_seconds: u64,
    pub cooldown_anchor: String,
    pub max_pending: Option<usize>,
}

impl From<&DispatchConfig> for DispatchSnapshot {
    fn from(cfg: &DispatchConfig) -> Self {
        Self {
            cooldown_seconds: cfg.cooldown_seconds,
            min_spacing_seconds: cfg.min_spacing_seconds,
            cooldown_anchor: cfg.cooldown_anchor.to_string(),
            max_pending: cfg.max_pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub log_filter: String,
    pub enabled: bool,
    pub endpoint: String,
    pub protocol: String,
    pub service_name: String,
    pub sample_ratio: f64,
}

impl From<&TelemetryConfig> for TelemetrySnapshot {
    fn from(cfg: &TelemetryConfig) -> Self {
        Self {
            log_filter: cfg.log_filter.clone(),
            enabled: cfg.enabled,
            endpoint: cfg.endpoint().to_owned(),
            protocol: cfg.protocol.to_string(),
            service_name: cfg.service_name.clone(),
            sample_ratio: cfg.sample_ratio,
        }
    }
}
