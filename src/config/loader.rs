//! Configuration loading from disk and the environment.
//!
//! Precedence, lowest first: built-in defaults, optional TOML file,
//! `APP_*` environment variables, `DEBUG`.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "APP_";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value '{value}' for {key}")]
    Env { key: String, value: String },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override and validate configuration.
///
/// `path` is optional; without it the defaults are the starting point.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => ServiceConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply `APP_*` overrides using `lookup` to read variables.
///
/// Taking the lookup as a closure keeps tests away from the process
/// environment.
pub fn apply_env_overrides<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

    if let Some(v) = var("HTTP_HOST") {
        config.http.host = v;
    }
    if let Some(v) = var("HTTP_PORT") {
        config.http.port = parse_var("HTTP_PORT", &v)?;
    }
    if let Some(v) = var("HTTP_REQUEST_TIMEOUT") {
        config.http.request_timeout_secs = parse_var("HTTP_REQUEST_TIMEOUT", &v)?;
    }
    if let Some(v) = var("HTTP_GRACEFUL_TIMEOUT") {
        config.shutdown.graceful_timeout_secs = parse_var("HTTP_GRACEFUL_TIMEOUT", &v)?;
    }
    if let Some(v) = var("HTTP_GRACEFUL_SLEEP") {
        config.shutdown.drain_sleep_secs = parse_var("HTTP_GRACEFUL_SLEEP", &v)?;
    }
    if let Some(v) = var("API_VERSION") {
        config.api_version = v;
    }
    if let Some(v) = var("DEPENDENCY_KIND") {
        config.dependency.kind = parse_var("DEPENDENCY_KIND", &v)?;
    }
    if let Some(v) = var("DEPENDENCY_ADDRESS") {
        config.dependency.address = v;
    }
    if let Some(v) = var("DEPENDENCY_REQUIRED") {
        config.dependency.required = parse_flag("DEPENDENCY_REQUIRED", &v)?;
    }
    if let Some(v) = var("DEPENDENCY_TIMEOUT") {
        config.dependency.timeout_secs = parse_var("DEPENDENCY_TIMEOUT", &v)?;
    }
    if let Some(v) = var("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = var("LOG_FORMAT") {
        config.observability.log_format = parse_var("LOG_FORMAT", &v)?;
    }
    if let Some(v) = var("METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_flag("METRICS_ENABLED", &v)?;
    }
    if let Some(v) = var("METRICS_LABEL_REQUEST_ID") {
        config.observability.metrics_label_request_id =
            parse_flag("METRICS_LABEL_REQUEST_ID", &v)?;
    }

    // DEBUG is deliberately unprefixed and lenient: anything but a known
    // truthy spelling means "off".
    if let Some(v) = lookup("DEBUG") {
        config.debug = is_debug_value(&v);
    }

    Ok(config)
}

/// `DEBUG=1`, `DEBUG=true` and `DEBUG=True` enable development mode.
pub fn is_debug_value(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key: format!("{}{}", ENV_PREFIX, name),
        value: value.to_string(),
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" | "True" | "TRUE" | "yes" => Ok(true),
        "0" | "false" | "False" | "FALSE" | "no" => Ok(false),
        _ => Err(ConfigError::Env {
            key: format!("{}{}", ENV_PREFIX, name),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{DependencyKind, LogFormat};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_take_precedence() {
        let config = apply_env_overrides(
            ServiceConfig::default(),
            env(&[
                ("APP_HTTP_PORT", "3000"),
                ("APP_HTTP_GRACEFUL_TIMEOUT", "12"),
                ("APP_HTTP_GRACEFUL_SLEEP", "3"),
                ("APP_DEPENDENCY_KIND", "tcp"),
                ("APP_DEPENDENCY_ADDRESS", "localhost:5432"),
                ("APP_LOG_FORMAT", "pretty"),
                ("DEBUG", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.http.port, 3000);
        assert_eq!(config.shutdown.graceful_timeout_secs, 12);
        assert_eq!(config.shutdown.drain_sleep_secs, 3);
        assert_eq!(config.dependency.kind, DependencyKind::Tcp);
        assert_eq!(config.dependency.address, "localhost:5432");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(config.debug);
    }

    #[test]
    fn malformed_number_is_reported_with_its_key() {
        let err = apply_env_overrides(ServiceConfig::default(), env(&[("APP_HTTP_PORT", "eighty")]))
            .unwrap_err();

        match err {
            ConfigError::Env { key, value } => {
                assert_eq!(key, "APP_HTTP_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn debug_accepts_only_known_spellings() {
        assert!(is_debug_value("1"));
        assert!(is_debug_value("true"));
        assert!(is_debug_value("True"));
        assert!(!is_debug_value("TRUE"));
        assert!(!is_debug_value("yes"));
        assert!(!is_debug_value(""));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
