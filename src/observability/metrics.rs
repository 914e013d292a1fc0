//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `http_requests_in_flight` (gauge): requests currently being handled
//! - `service_lifecycle_healthy` (gauge): 1=serving, 0=draining
//! - `dependency_probe_total` (counter): liveness probe outcomes
//!
//! # Design Decisions
//! - One Prometheus recorder per process, installed on first use
//! - Histogram buckets tuned for typical web latencies

use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

use metrics::Label;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// Install the global Prometheus recorder, or return the existing handle.
///
/// Safe to call from several places (and from every test); only the first
/// call installs.
pub fn init_recorder() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }

    let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)?
        .install_recorder()?;
    describe();

    let _ = HANDLE.set(handle.clone());
    Ok(handle)
}

fn describe() {
    metrics::describe_counter!(REQUESTS_TOTAL, "Total HTTP requests handled");
    metrics::describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
    metrics::describe_gauge!(REQUESTS_IN_FLIGHT, "HTTP requests currently in flight");
    metrics::describe_gauge!("service_lifecycle_healthy", "1 while serving, 0 once draining");
    metrics::describe_counter!("dependency_probe_total", "Dependency liveness checks by outcome");
}

/// Record a completed request.
///
/// `request_id` is only attached as a label when the caller opted in.
pub fn record_request(
    method: &str,
    path: &str,
    status: u16,
    request_id: Option<&str>,
    start_time: Instant,
) {
    let latency = start_time.elapsed().as_secs_f64();

    let mut labels = vec![
        Label::new("method", method.to_string()),
        Label::new("path", path.to_string()),
        Label::new("status", status.to_string()),
    ];
    if let Some(id) = request_id {
        labels.push(Label::new("request_id", id.to_string()));
    }

    metrics::counter!(REQUESTS_TOTAL, labels.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, labels).record(latency);
}

/// Render the current state in the Prometheus text format.
pub fn render() -> String {
    HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
