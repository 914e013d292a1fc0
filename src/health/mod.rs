//! Dependency health subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/health
//!     → probe.rs (spawn check, enforce time budget)
//!     → dependency.rs (TCP / HTTP / no-op check)
//!     → snapshot.rs (uptime + dependency status, serialized per call)
//! ```
//!
//! # Design Decisions
//! - Each liveness poll is a fresh attempt; failures are never retried
//! - A failing dependency is reported in the body, never fatal
//! - Readiness does not use this subsystem

pub mod dependency;
pub mod probe;
pub mod snapshot;

pub use dependency::{HttpProbe, NoopProbe, TcpProbe};
pub use probe::{check_with_timeout, DependencyError, DependencyProbe};
pub use snapshot::HealthSnapshot;
