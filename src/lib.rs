//! Production HTTP service scaffold.
//!
//! Probe and metadata endpoints behind a fixed middleware chain, with
//! graceful shutdown that drains traffic before exiting.

pub mod build_info;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
