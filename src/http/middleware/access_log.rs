//! Access logging interceptor.
//!
//! One event per completed request, emitted after the inner chain returns so
//! the final status and elapsed time are known.

use std::time::Instant;

use axum::{body::Body, http::header::USER_AGENT, http::Request, middleware::Next, response::Response};

use crate::http::request::{remote_addr, ApiVersion, RequestIdExt};

pub async fn log_access(request: Request<Body>, next: Next) -> Response {
    let begin = Instant::now();

    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let proto = request.version();
    let remote = remote_addr(&request);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let response = next.run(request).await;

    // The version interceptor sits inside this one, so its tag is read back
    // from the response.
    let api_version = response
        .extensions()
        .get::<ApiVersion>()
        .map(|v| v.as_str().to_string())
        .unwrap_or_default();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        proto = ?proto,
        remote = %remote,
        api_version = %api_version,
        status = response.status().as_u16(),
        user_agent = %user_agent,
        took = ?begin.elapsed(),
        "req"
    );

    response
}
