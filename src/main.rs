//! Service entry point.
//!
//! ```text
//!     ┌──────────┐   ┌───────────┐   ┌──────────────────────────────────┐
//!     │  config  │──▶│  logging  │──▶│ startup::run                      │
//!     │ file+env │   │ + metrics │   │  probe → bind → serve → drain     │
//!     └──────────┘   └───────────┘   └──────────────────────────────────┘
//! ```
//!
//! Exit codes: 0 after shutdown (graceful or not), 1 when startup fails or a
//! second termination signal forces the exit.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use service_template::config::load_config;
use service_template::lifecycle::{startup, ShutdownOutcome, StartupError};
use service_template::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "service-template", version, about = "HTTP service with health probes and graceful shutdown")]
struct Cli {
    /// Path to a TOML config file. APP_* environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging depends on config, so config errors go straight to stderr.
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("service-template: {}", StartupError::from(e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("service-template: {}", StartupError::from(e));
        return ExitCode::FAILURE;
    }

    match startup::run(config).await {
        Ok(ShutdownOutcome::Graceful) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Ok(ShutdownOutcome::TimedOut) => {
            tracing::warn!("Shutdown complete, some requests were cut off");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
