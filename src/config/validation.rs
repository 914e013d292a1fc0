//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work. Every problem is collected so a single run reports all of them.

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::{DependencyKind, ServiceConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.host.parse::<IpAddr>().is_err() && config.http.host != "localhost" {
        errors.push(ValidationError::new(
            "http.host",
            format!("'{}' is not an IP address", config.http.host),
        ));
    }

    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be > 0"));
    }

    if config.shutdown.graceful_timeout_secs == 0 {
        errors.push(ValidationError::new("shutdown.graceful_timeout_secs", "must be > 0"));
    }

    if config.api_version.trim().is_empty() {
        errors.push(ValidationError::new("api_version", "must not be empty"));
    }

    let dependency = &config.dependency;
    if dependency.timeout_secs == 0 {
        errors.push(ValidationError::new("dependency.timeout_secs", "must be > 0"));
    }
    match dependency.kind {
        DependencyKind::None => {
            if dependency.required {
                errors.push(ValidationError::new(
                    "dependency.required",
                    "a required dependency needs a kind other than 'none'",
                ));
            }
        }
        DependencyKind::Tcp => {
            if dependency.address.parse::<SocketAddr>().is_err()
                && !looks_like_host_port(&dependency.address)
            {
                errors.push(ValidationError::new(
                    "dependency.address",
                    format!("'{}' is not host:port", dependency.address),
                ));
            }
        }
        DependencyKind::Http => {
            if !(dependency.address.starts_with("http://") && dependency.address.len() > 7) {
                errors.push(ValidationError::new(
                    "dependency.address",
                    format!("'{}' is not an http:// URL", dependency.address),
                ));
            }
        }
    }

    if config.observability.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn looks_like_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
