//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests currently inside the router
//! - Publish the count as the `http_requests_in_flight` gauge
//! - Report what is still running when shutdown starts

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::observability::metrics::REQUESTS_IN_FLIGHT;

/// Shared counter of requests being handled.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new request. The returned guard decrements on drop, including
    /// when the handler future is cancelled.
    pub fn track(&self) -> InFlightGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::gauge!(REQUESTS_IN_FLIGHT).set(now as f64);
        InFlightGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard for one in-flight request.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::gauge!(REQUESTS_IN_FLIGHT).set(now as f64);
    }
}

/// Middleware holding an [`InFlightGuard`] for the duration of the request.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let _guard = tracker.track();
    next.run(request).await
}
