//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener and request handling settings.
    pub http: HttpConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// External dependency checked by the liveness probe.
    pub dependency: DependencyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// API version tag stamped on every request and response.
    pub api_version: String,

    /// Development mode: verbose logging, no drain sleep on shutdown.
    pub debug: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            shutdown: ShutdownConfig::default(),
            dependency: DependencyConfig::default(),
            observability: ObservabilityConfig::default(),
            api_version: crate::build_info::API_VERSION.to_string(),
            debug: false,
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Host or IP to bind to.
    pub host: String,

    /// Port to listen on. `0` asks the OS for a free port.
    pub port: u16,

    /// Upper bound on the time spent handling a single request, in seconds.
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    /// Produce a host:port address for binding a TcpListener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 60,
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight requests may take to finish once the listener
    /// stops accepting, in seconds.
    pub graceful_timeout_secs: u64,

    /// Delay between flipping readiness and closing the listener, in seconds.
    /// Must exceed the orchestrator's readiness polling interval.
    pub drain_sleep_secs: u64,
}

impl ShutdownConfig {
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout_secs)
    }

    pub fn drain_sleep(&self) -> Duration {
        Duration::from_secs(self.drain_sleep_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout_secs: 30,
            drain_sleep_secs: 10,
        }
    }
}

/// Kind of dependency probed by the liveness endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// No dependency; the probe always succeeds.
    #[default]
    None,
    /// Plain TCP connect to `address` (host:port).
    Tcp,
    /// HTTP GET on `address` (a full URL), 2xx means alive.
    Http,
}

impl std::str::FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(DependencyKind::None),
            "tcp" => Ok(DependencyKind::Tcp),
            "http" => Ok(DependencyKind::Http),
            other => Err(format!("unknown dependency kind '{}'", other)),
        }
    }
}

/// Dependency health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DependencyConfig {
    pub kind: DependencyKind,

    /// `host:port` for TCP probes, URL for HTTP probes.
    pub address: String,

    /// Refuse to start when the dependency is unreachable at startup.
    pub required: bool,

    /// Time budget for a single liveness probe, in seconds.
    pub timeout_secs: u64,
}

impl DependencyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            kind: DependencyKind::None,
            address: String::new(),
            required: false,
            timeout_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Expose `/metrics` and record request metrics.
    pub metrics_enabled: bool,

    /// Add the correlation id as a label on request metrics.
    /// Every request creates a new series, so keep this off unless the
    /// scraper drops the label.
    pub metrics_label_request_id: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: true,
            metrics_label_request_id: false,
        }
    }
}
