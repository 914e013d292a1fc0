//! Request-scoped metadata.
//!
//! # Responsibilities
//! - Correlation identifier for the request (reused from `x-request-id` or
//!   generated as UUID v4)
//! - Negotiated API version tag
//! - Best-effort client address for logging
//!
//! # Design Decisions
//! - Request ID added as early as possible so every later layer can log it
//! - Values live in request/response extensions, never in shared state

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_API_VERSION: HeaderName = HeaderName::from_static("x-api-version");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Longest inbound `x-request-id` accepted as-is.
const MAX_INBOUND_ID_LEN: usize = 128;

/// Opaque per-request correlation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// A fresh UUID v4.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept an inbound id if it is short, non-empty visible ASCII.
    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        let value = value.to_str().ok()?.trim();
        let valid = !value.is_empty()
            && value.len() <= MAX_INBOUND_ID_LEN
            && value.bytes().all(|b| b.is_ascii_graphic());
        valid.then(|| Self(value.to_string()))
    }

    /// Reuse the inbound header when valid, otherwise generate.
    pub fn from_headers_or_generate(headers: &HeaderMap) -> Self {
        headers
            .get(X_REQUEST_ID)
            .and_then(Self::from_header)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_header_value(&self) -> HeaderValue {
        // Generated ids are UUIDs and inbound ids were validated as visible
        // ASCII, so this cannot fail; fall back to an empty value anyway.
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request data created by the correlation interceptor.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            started_at: Instant::now(),
        }
    }
}

/// API version tag negotiated for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion(pub String);

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accessors for request-scoped metadata.
pub trait RequestIdExt {
    /// Correlation id, or `""` when the correlation interceptor is disabled.
    fn request_id(&self) -> &str;

    fn api_version(&self) -> Option<&ApiVersion>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.extensions()
            .get::<RequestContext>()
            .map(|ctx| ctx.correlation_id.as_str())
            .unwrap_or("")
    }

    fn api_version(&self) -> Option<&ApiVersion> {
        self.extensions().get::<ApiVersion>()
    }
}

/// Client address for logging.
///
/// Prefers the first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// socket peer. The headers are client-controlled: this is fine for logs and
/// must not be used for access decisions.
pub fn remote_addr<B>(request: &Request<B>) -> String {
    let headers = request.headers();

    if let Some(xff) = headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        if !xff.is_empty() {
            return xff.split(", ").next().unwrap_or(xff).to_string();
        }
    }

    if let Some(real_ip) = headers.get(X_REAL_IP).and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}
