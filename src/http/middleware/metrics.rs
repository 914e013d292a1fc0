//! Metrics interceptor.
//!
//! Outermost layer of the chain, so the recorded latency covers every other
//! interceptor and the status is the one the client sees.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::CorrelationId;
use crate::observability::metrics;

/// `path` label for requests no route matched (404/405 fallbacks). The raw
/// URI is client-controlled and would create unbounded series.
pub const UNMATCHED_PATH: &str = "<unmatched>";

/// Settings for [`track_metrics`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsOptions {
    /// Attach the correlation id as a `request_id` label.
    pub label_request_id: bool,
}

pub async fn track_metrics(
    State(options): State<MetricsOptions>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();

    let path = if let Some(matched_path) = request.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        UNMATCHED_PATH.to_owned()
    };
    let method = request.method().clone();

    let response = next.run(request).await;

    // Set on the way out by the correlation interceptor; empty when it is
    // disabled.
    let request_id = response
        .extensions()
        .get::<CorrelationId>()
        .map(CorrelationId::as_str)
        .unwrap_or("");
    let status = response.status().as_u16();

    metrics::record_request(
        method.as_str(),
        &path,
        status,
        options.label_request_id.then_some(request_id),
        start,
    );
    tracing::trace!(request_id = %request_id, method = %method, path = %path, status, "Request metrics recorded");

    response
}
