use std::fmt;

use serde::Deserialize;

/// Log output and optional OTLP span export.
///
/// ```toml
/// [telemetry]
/// log_filter = "info,refire_executor=debug"
/// enabled = true
/// protocol = "http"
/// sample_ratio = 0.5
/// ```
///
/// `RUST_LOG`, when set, wins over `log_filter`. Without an explicit
/// `endpoint` the collector is expected on localhost at the default port
/// of the chosen protocol.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives for the log output.
    pub log_filter: String,
    /// Export trace spans over OTLP.
    pub enabled: bool,
    pub protocol: OtlpProtocol,
    /// Collector endpoint; see [`TelemetryConfig::endpoint`].
    #[serde(rename = "endpoint")]
    pub endpoint_override: Option<String>,
    pub service_name: String,
    /// Fraction of root spans kept, `0.0..=1.0`.
    pub sample_ratio: f64,
}

impl TelemetryConfig {
    /// Collector endpoint the exporter connects to.
    pub fn endpoint(&self) -> &str {
        self.endpoint_override
            .as_deref()
            .unwrap_or_else(|| self.protocol.default_endpoint())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
            enabled: false,
            protocol: OtlpProtocol::default(),
            endpoint_override: None,
            service_name: "refire".to_owned(),
            sample_ratio: 1.0,
        }
    }
}

/// OTLP transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

impl OtlpProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grpc => "grpc",
            Self::Http => "http",
        }
    }

    fn default_endpoint(self) -> &'static str {
        match self {
            Self::Grpc => "http://localhost:4317",
            Self::Http => "http://localhost:4318/v1/traces",
        }
    }
}

impl fmt::Display for OtlpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
