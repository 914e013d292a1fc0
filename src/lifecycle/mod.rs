//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics → Dependency check → Bind → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancel root shutdown token
//!     second signal  → exit(1)
//!
//! Shutdown (shutdown.rs + state.rs):
//!     Token cancelled → probes report 503 → drain sleep → stop accepting
//!     → wait for in-flight requests (bounded) → exit(0)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - One root token; every long-running task observes it
//! - Shutdown has a deadline; a second signal skips it entirely

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{Shutdown, ShutdownOrchestrator, ShutdownOutcome, ShutdownPhase, ShutdownSignal};
pub use startup::StartupError;
pub use state::{Lifecycle, LifecycleState};
