//! API version interceptor.
//!
//! The service's configured version is authoritative: an inbound
//! `x-api-version` header is overwritten, never trusted.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::http::request::{ApiVersion, X_API_VERSION};

pub async fn inject_api_version(
    State(version): State<ApiVersion>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = HeaderValue::from_str(version.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));

    request.headers_mut().insert(X_API_VERSION, header.clone());
    request.extensions_mut().insert(version.clone());

    let mut response = next.run(request).await;

    response.headers_mut().insert(X_API_VERSION, header);
    response.extensions_mut().insert(version);
    response
}
