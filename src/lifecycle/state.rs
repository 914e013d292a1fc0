//! Process-wide serving state.
//!
//! # States
//! - Serving: probes report healthy/ready
//! - Draining: probes report 503 until the process exits
//!
//! # State Transitions
//! ```text
//! Serving → Draining: root shutdown token cancelled (one-way)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::lifecycle::shutdown::ShutdownSignal;

/// Serving state observed by the probe handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Serving,
    Draining,
}

/// Single-writer, many-reader view of [`LifecycleState`].
///
/// Cloning shares the same underlying flag.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    healthy: Arc<AtomicBool>,
}

impl Lifecycle {
    /// Create a controller in the `Serving` state.
    pub fn new() -> Self {
        let lifecycle = Self {
            healthy: Arc::new(AtomicBool::new(true)),
        };
        lifecycle.publish();
        lifecycle
    }

    /// Whether the service should still be reported healthy and ready.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Current state, derived from the health flag.
    pub fn state(&self) -> LifecycleState {
        if self.is_healthy() {
            LifecycleState::Serving
        } else {
            LifecycleState::Draining
        }
    }

    /// Switch to `Draining`. Idempotent; there is no way back.
    pub fn mark_unhealthy(&self) {
        if self.healthy.swap(false, Ordering::AcqRel) {
            tracing::info!("Lifecycle switched to draining, probes now report 503");
            self.publish();
        }
    }

    /// Spawn a task that marks the service unhealthy once `signal` fires.
    pub fn watch(&self, mut signal: ShutdownSignal) -> tokio::task::JoinHandle<()> {
        let lifecycle = self.clone();
        tokio::spawn(async move {
            signal.wait().await;
            lifecycle.mark_unhealthy();
        })
    }

    fn publish(&self) {
        let value = if self.is_healthy() { 1.0 } else { 0.0 };
        metrics::gauge!("service_lifecycle_healthy").set(value);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
