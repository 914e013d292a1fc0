//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file
//!     → loader.rs (parse & deserialize, apply APP_* overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to startup, the router and the shutdown orchestrator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the service runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DependencyConfig, DependencyKind, HttpConfig, LogFormat, ObservabilityConfig, ServiceConfig,
    ShutdownConfig,
};
pub use validation::ValidationError;

/// Mask all but the last `keep` characters of `value`.
///
/// Used when logging config values that may carry credentials.
pub fn mask_left(value: &str, keep: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let masked = chars.len().saturating_sub(keep);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < masked { 'X' } else { *c })
        .collect()
}

impl ServiceConfig {
    /// Log every effective value, one event per field.
    pub fn log_effective(&self) {
        tracing::info!(http_host = %self.http.host, "config value");
        tracing::info!(http_port = self.http.port, "config value");
        tracing::info!(http_request_timeout_secs = self.http.request_timeout_secs, "config value");
        tracing::info!(http_graceful_timeout_secs = self.shutdown.graceful_timeout_secs, "config value");
        tracing::info!(http_graceful_sleep_secs = self.shutdown.drain_sleep_secs, "config value");
        tracing::info!(api_version = %self.api_version, "config value");
        tracing::info!(dependency_kind = ?self.dependency.kind, "config value");
        tracing::info!(dependency_address = %mask_left(&self.dependency.address, 4), "config value");
        tracing::info!(dependency_required = self.dependency.required, "config value");
        tracing::info!(dependency_timeout_secs = self.dependency.timeout_secs, "config value");
        tracing::info!(log_level = %self.observability.log_level, "config value");
        tracing::info!(log_format = ?self.observability.log_format, "config value");
        tracing::info!(metrics_enabled = self.observability.metrics_enabled, "config value");
        tracing::info!(
            metrics_label_request_id = self.observability.metrics_label_request_id,
            "config value"
        );
        tracing::info!(debug = self.debug, "config value");
    }
}
