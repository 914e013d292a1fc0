//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Refuse to start when a required dependency is down
//! - Bind the listener and begin accepting traffic
//! - Hand the running server to the shutdown orchestrator
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal (exit code 1)
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::build_info;
use crate::config::{ConfigError, DependencyConfig, HttpConfig, ServiceConfig};
use crate::health::{check_with_timeout, dependency, DependencyError, DependencyProbe};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{Shutdown, ShutdownOrchestrator, ShutdownOutcome};
use crate::lifecycle::signals;
use crate::lifecycle::state::Lifecycle;
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("required dependency unavailable: {0}")]
    Dependency(#[from] DependencyError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
}

/// Bind the service listener.
pub async fn bind_listener(config: &HttpConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    match listener.local_addr() {
        Ok(local) => tracing::info!(address = %local, "Listening for connections"),
        Err(e) => tracing::warn!(address = %address, error = %e, "Bound, but local address unknown"),
    }
    Ok(listener)
}

/// Build the configured dependency probe.
pub fn build_probe(config: &DependencyConfig) -> Result<Arc<dyn DependencyProbe>, StartupError> {
    let probe = dependency::from_config(config)?;
    tracing::debug!(dependency = %probe.name(), required = config.required, "Dependency probe ready");
    Ok(probe)
}

/// Check `probe` once if the dependency is marked required.
///
/// Optional dependencies are never checked here; their state only shows up
/// in the liveness report.
pub async fn check_required_dependency(
    config: &DependencyConfig,
    probe: Arc<dyn DependencyProbe>,
) -> Result<(), StartupError> {
    if !config.required {
        return Ok(());
    }

    let name = probe.name().to_string();
    check_with_timeout(probe, config.timeout()).await?;
    tracing::info!(dependency = %name, "Required dependency is reachable");
    Ok(())
}

/// Start every subsystem and serve until shutdown completes.
///
/// Logging must already be initialized.
pub async fn run(config: ServiceConfig) -> Result<ShutdownOutcome, StartupError> {
    tracing::info!(
        app = build_info::APP_NAME,
        version = build_info::APP_VERSION,
        commit = build_info::GIT_COMMIT_HASH,
        "Service starting"
    );
    config.log_effective();

    if config.observability.metrics_enabled {
        metrics::init_recorder()?;
    }

    let probe = build_probe(&config.dependency)?;
    check_required_dependency(&config.dependency, Arc::clone(&probe)).await?;

    let listener = bind_listener(&config.http).await?;

    let shutdown = Shutdown::new();
    let lifecycle = Lifecycle::new();
    lifecycle.watch(shutdown.subscribe());
    signals::spawn_signal_watcher(shutdown.clone()).map_err(StartupError::Signals)?;

    let orchestrator = ShutdownOrchestrator::new(&config.shutdown, config.debug, lifecycle.clone());
    let server = HttpServer::new(&config, lifecycle, probe)
        .spawn(listener)
        .map_err(|source| StartupError::Bind {
            address: config.http.bind_address(),
            source,
        })?;

    Ok(orchestrator.run(shutdown.subscribe(), server).await)
}
