//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request chain and lifecycle produce:
//!     → logging.rs (structured log events, JSON in production)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape of /metrics)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every access log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
