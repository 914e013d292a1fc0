//! Probe and metadata endpoints.
//!
//! # Endpoints
//! - `GET /api/version`  build metadata
//! - `GET /api/health`   liveness: uptime plus a bounded dependency check
//! - `GET /api/ready`    readiness: flips to 503 once draining starts
//! - `GET /metrics`      Prometheus exposition (when enabled)
//!
//! Both probes answer 503 while draining, before any dependency is touched.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::health::{check_with_timeout, HealthSnapshot};
use crate::http::response::{json, ApiError};
use crate::http::server::AppState;
use crate::observability::metrics;

pub const SHUTDOWN_STARTED_MSG: &str = "graceful shutdown started";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Serialize)]
struct ReadyBody {
    msg: &'static str,
}

pub async fn version(State(state): State<AppState>) -> Response {
    json(StatusCode::OK, &*state.build_info)
}

pub async fn healthz(State(state): State<AppState>) -> Response {
    if !state.lifecycle.is_healthy() {
        return ApiError::new(StatusCode::SERVICE_UNAVAILABLE, SHUTDOWN_STARTED_MSG).into_response();
    }

    let dependency = check_with_timeout(state.probe.clone(), state.probe_timeout).await;
    let snapshot = HealthSnapshot::new(state.started_at, &dependency);

    let status = if snapshot.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    json(status, &snapshot)
}

pub async fn readyz(State(state): State<AppState>) -> Response {
    if !state.lifecycle.is_healthy() {
        return ApiError::new(StatusCode::SERVICE_UNAVAILABLE, SHUTDOWN_STARTED_MSG).into_response();
    }
    json(StatusCode::OK, &ReadyBody { msg: "OK" })
}

pub async fn prometheus() -> Response {
    let mut response = metrics::render().into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
    );
    response
}

/// Unknown paths get the error envelope instead of an empty body.
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not found")
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}
