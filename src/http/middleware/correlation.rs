//! Correlation-ID interceptor.
//!
//! Runs before anything that logs or reports status. The id is written to:
//! - request extensions as [`RequestContext`] (for handlers and the access log)
//! - the `x-request-id` request header (for anything forwarded downstream)
//! - the `x-request-id` response header and response extensions (for the
//!   client and the metrics interceptor)
//! - a `request` span around the rest of the chain, so every event logged
//!   while handling the request carries `request_id`

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::Instrument;

use crate::http::request::{CorrelationId, RequestContext, X_REQUEST_ID};

pub async fn assign_correlation_id(mut request: Request<Body>, next: Next) -> Response {
    let id = CorrelationId::from_headers_or_generate(request.headers());
    let header = id.to_header_value();

    request.headers_mut().insert(X_REQUEST_ID, header.clone());
    request
        .extensions_mut()
        .insert(RequestContext::new(id.clone()));

    let span = tracing::info_span!("request", request_id = %id);
    let mut response = next.run(request).instrument(span).await;

    response.headers_mut().insert(X_REQUEST_ID, header);
    response.extensions_mut().insert(id);
    response
}
