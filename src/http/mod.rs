//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → in_flight.rs (count requests still running)
//!     → middleware/ (metrics → correlation id → access log → api version)
//!     → handlers.rs (version, health, ready, metrics)
//!     → response.rs (JSON body or error envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod in_flight;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{Interceptor, MiddlewareChain};
pub use request::{CorrelationId, RequestIdExt, X_API_VERSION, X_REQUEST_ID};
pub use response::{ApiError, ErrorEnvelope};
pub use server::{HttpServer, RunningServer};
