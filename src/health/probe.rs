//! Dependency health probe contract and bounded execution.
//!
//! The liveness endpoint never awaits a dependency directly. The check runs
//! on its own task and is aborted when the time budget runs out, so a
//! dependency that never answers cannot stall the probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

/// Why a dependency was reported down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    #[error("dependency unreachable: {0}")]
    Unreachable(String),
    #[error("dependency unhealthy: {0}")]
    Unhealthy(String),
    #[error("dependency check timed out after {0:?}")]
    Timeout(Duration),
    #[error("dependency check aborted: {0}")]
    Aborted(String),
}

/// An external collaborator whose liveness the service reports.
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &str;

    /// Check the dependency. Implementations should give up by `deadline`,
    /// but callers do not rely on it.
    async fn check_alive(&self, deadline: Instant) -> Result<(), DependencyError>;
}

/// Aborts the wrapped task when dropped, whichever way the owner exits.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `probe` with a hard `timeout`.
///
/// The check is spawned and aborted at the deadline regardless of whether
/// the probe itself honours `deadline`. It is also aborted if the caller
/// goes away first.
pub async fn check_with_timeout(
    probe: Arc<dyn DependencyProbe>,
    timeout: Duration,
) -> Result<(), DependencyError> {
    let deadline = Instant::now() + timeout;
    let name = probe.name().to_string();

    let mut check = AbortOnDrop(tokio::spawn(
        async move { probe.check_alive(deadline).await }.in_current_span(),
    ));

    let result = match tokio::time::timeout_at(deadline, &mut check.0).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(DependencyError::Aborted(join_error.to_string())),
        Err(_) => Err(DependencyError::Timeout(timeout)),
    };
    drop(check);

    let outcome = match &result {
        Ok(()) => "up",
        Err(DependencyError::Timeout(_)) => "timeout",
        Err(_) => "down",
    };
    metrics::counter!(
        "dependency_probe_total",
        "dependency" => name.clone(),
        "outcome" => outcome
    )
    .increment(1);

    if let Err(e) = &result {
        tracing::warn!(dependency = %name, error = %e, "Dependency check failed");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Hung {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DependencyProbe for Hung {
        fn name(&self) -> &str {
            "hung"
        }

        async fn check_alive(&self, _deadline: Instant) -> Result<(), DependencyError> {
            let _flag = DropFlag(self.dropped.clone());
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl DependencyProbe for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn check_alive(&self, _deadline: Instant) -> Result<(), DependencyError> {
            Err(DependencyError::Unreachable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn hung_probe_is_cancelled_at_deadline() {
        let dropped = Arc::new(AtomicBool::new(false));
        let probe = Arc::new(Hung {
            dropped: dropped.clone(),
        });

        let started = std::time::Instant::now();
        let result = check_with_timeout(probe, Duration::from_millis(100)).await;

        assert_eq!(result, Err(DependencyError::Timeout(Duration::from_millis(100))));
        assert!(started.elapsed() < Duration::from_secs(1));

        // The aborted task drops its future on the next scheduler pass.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(dropped.load(Ordering::SeqCst), "probe future should be dropped");
    }

    #[tokio::test]
    async fn hung_check_is_cancelled_when_caller_goes_away() {
        let dropped = Arc::new(AtomicBool::new(false));
        let probe = Arc::new(Hung {
            dropped: dropped.clone(),
        });

        let caller = tokio::spawn(check_with_timeout(probe, Duration::from_secs(5)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!dropped.load(Ordering::SeqCst));

        caller.abort();
        let _ = caller.await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(
            dropped.load(Ordering::SeqCst),
            "check future should be dropped with its caller"
        );
    }

    #[tokio::test]
    async fn failure_is_passed_through() {
        let result = check_with_timeout(Arc::new(Failing), Duration::from_secs(1)).await;
        assert_eq!(
            result,
            Err(DependencyError::Unreachable("connection refused".into()))
        );
    }
}
