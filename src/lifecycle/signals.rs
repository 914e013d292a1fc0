//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGTERM/SIGINT handlers
//! - First signal cancels the root [`Shutdown`] token
//! - Second signal escalates to an immediate exit
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The watcher consumes any stream of [`TerminationSignal`]s, so tests can
//!   drive it without sending real signals to the test process

use futures_util::{Stream, StreamExt};

use crate::lifecycle::shutdown::Shutdown;

/// Exit status used when a second signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 1;

/// Signals that start (or escalate) shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl TerminationSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
        }
    }
}

/// What the watcher decided once its stream stopped yielding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// A second signal arrived; the caller must exit right away.
    ForceExit,
    /// The stream ended with at most one signal seen.
    Ended,
}

/// Watch `signals`: trigger `shutdown` on the first, return
/// [`Escalation::ForceExit`] on the second.
pub async fn watch_signals<S>(signals: S, shutdown: Shutdown) -> Escalation
where
    S: Stream<Item = TerminationSignal>,
{
    futures_util::pin_mut!(signals);

    let Some(first) = signals.next().await else {
        return Escalation::Ended;
    };
    tracing::info!(signal = first.as_str(), "Termination signal received, starting graceful shutdown");
    shutdown.trigger();

    match signals.next().await {
        Some(second) => {
            tracing::warn!(signal = second.as_str(), "Second termination signal received, exiting immediately");
            Escalation::ForceExit
        }
        None => Escalation::Ended,
    }
}

/// Stream of SIGINT/SIGTERM deliveries for this process.
#[cfg(unix)]
pub fn os_signals() -> std::io::Result<impl Stream<Item = TerminationSignal>> {
    use tokio::signal::unix::{signal, SignalKind};

    let sigint = signal(SignalKind::interrupt())?;
    let sigterm = signal(SignalKind::terminate())?;

    Ok(futures_util::stream::unfold(
        (sigint, sigterm),
        |(mut sigint, mut sigterm)| async move {
            let received = tokio::select! {
                Some(()) = sigint.recv() => TerminationSignal::Interrupt,
                Some(()) = sigterm.recv() => TerminationSignal::Terminate,
                else => return None,
            };
            Some((received, (sigint, sigterm)))
        },
    ))
}

/// Stream of Ctrl+C deliveries (non-unix targets).
#[cfg(not(unix))]
pub fn os_signals() -> std::io::Result<impl Stream<Item = TerminationSignal>> {
    Ok(futures_util::stream::unfold((), |()| async move {
        tokio::signal::ctrl_c().await.ok()?;
        Some((TerminationSignal::Interrupt, ()))
    }))
}

/// Spawn the process signal watcher.
///
/// The returned task exits the process with [`FORCED_EXIT_CODE`] on a
/// second signal.
pub fn spawn_signal_watcher(shutdown: Shutdown) -> std::io::Result<tokio::task::JoinHandle<()>> {
    let signals = os_signals()?;
    Ok(tokio::spawn(async move {
        if watch_signals(signals, shutdown).await == Escalation::ForceExit {
            std::process::exit(FORCED_EXIT_CODE);
        }
    }))
}
