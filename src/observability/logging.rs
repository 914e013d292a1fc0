//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level from config, `RUST_LOG` wins when set; debug mode forces `debug`
//! - JSON lines include the current span, which carries `request_id`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ServiceConfig};

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(config: &ServiceConfig) -> String {
    let level = if config.debug {
        "debug"
    } else {
        config.observability.log_level.as_str()
    };
    format!("{}={},tower_http={}", env!("CARGO_CRATE_NAME"), level, level)
}

/// Install the global tracing subscriber.
///
/// Returns an error if a subscriber was already installed.
pub fn init(config: &ServiceConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let format = if config.debug {
        LogFormat::Pretty
    } else {
        config.observability.log_format
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_span_list(false))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}
