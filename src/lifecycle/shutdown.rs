//! Shutdown coordination for the service.
//!
//! [`Shutdown`] is the root cancellation token: cancelled once, observed by
//! any number of [`ShutdownSignal`]s, including ones created after the fact.
//! [`ShutdownOrchestrator`] runs the drain sequence once it fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::ShutdownConfig;
use crate::http::server::RunningServer;
use crate::lifecycle::state::Lifecycle;

/// Root cancellation token.
///
/// Cloning shares the same token.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new, not yet triggered, shutdown token.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal. Later calls are no-ops.
    pub fn trigger(&self) {
        let changed = self.tx.send_if_modified(|triggered| {
            let first = !*triggered;
            *triggered = true;
            first
        });
        if changed {
            tracing::info!("Shutdown triggered");
        }
    }

    /// Whether [`Shutdown::trigger`] has been called.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait until shutdown is triggered. Returns immediately if it already was.
    pub async fn wait(&mut self) {
        // An Err means every sender is gone, which can only happen once the
        // process is tearing down; treat it as shutdown.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }

    /// Non-blocking check.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Steps of the shutdown sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    SignalReceived,
    Draining,
    Stopped,
}

/// How the listener went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request finished within the graceful timeout.
    Graceful,
    /// The timeout elapsed first; remaining requests were dropped.
    TimedOut,
}

/// Errors surfaced while stopping the listener.
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("in-flight requests did not finish within {0:?}")]
    Timeout(Duration),
    #[error("HTTP server exited with error: {0}")]
    Server(#[from] std::io::Error),
    #[error("HTTP server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs `SignalReceived → Draining → Stopped` for one server.
#[derive(Debug, Clone)]
pub struct ShutdownOrchestrator {
    lifecycle: Lifecycle,
    drain_sleep: Duration,
    graceful_timeout: Duration,
}

impl ShutdownOrchestrator {
    /// Build from config. In debug mode the drain sleep is skipped.
    pub fn new(config: &ShutdownConfig, debug: bool, lifecycle: Lifecycle) -> Self {
        let drain_sleep = if debug {
            Duration::ZERO
        } else {
            config.drain_sleep()
        };
        Self {
            lifecycle,
            drain_sleep,
            graceful_timeout: config.graceful_timeout(),
        }
    }

    pub fn drain_sleep(&self) -> Duration {
        self.drain_sleep
    }

    pub fn graceful_timeout(&self) -> Duration {
        self.graceful_timeout
    }

    /// Wait for `signal`, then drain and stop `server`.
    ///
    /// Never fails: a shutdown error is logged and reported as
    /// [`ShutdownOutcome::TimedOut`] so the caller can still exit.
    pub async fn run(&self, mut signal: ShutdownSignal, server: RunningServer) -> ShutdownOutcome {
        tracing::debug!(phase = ?ShutdownPhase::Running, "Waiting for shutdown signal");
        signal.wait().await;

        tracing::info!(
            phase = ?ShutdownPhase::SignalReceived,
            in_flight = server.in_flight(),
            "Shutdown signal received"
        );
        self.lifecycle.mark_unhealthy();

        if !self.drain_sleep.is_zero() {
            tracing::info!(
                phase = ?ShutdownPhase::Draining,
                sleep = ?self.drain_sleep,
                "Waiting for load balancers to observe readiness change"
            );
            tokio::time::sleep(self.drain_sleep).await;
        }

        tracing::info!(
            phase = ?ShutdownPhase::Draining,
            timeout = ?self.graceful_timeout,
            in_flight = server.in_flight(),
            "Shutting down HTTP server"
        );

        match server.shutdown(self.graceful_timeout).await {
            Ok(()) => {
                tracing::info!(phase = ?ShutdownPhase::Stopped, "HTTP server gracefully stopped");
                ShutdownOutcome::Graceful
            }
            Err(e) => {
                tracing::error!(phase = ?ShutdownPhase::Stopped, error = %e, "HTTP server graceful shutdown failed");
                ShutdownOutcome::TimedOut
            }
        }
    }
}
