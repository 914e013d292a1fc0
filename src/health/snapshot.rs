//! Point-in-time health report for the liveness endpoint.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::health::probe::DependencyError;

/// Computed on every liveness call; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    /// Time since process start, e.g. `"1h2m3.004s"`.
    pub uptime: String,
    pub dependency_status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthSnapshot {
    pub fn new(started_at: Instant, dependency: &Result<(), DependencyError>) -> Self {
        Self {
            uptime: format_uptime(started_at.elapsed()),
            dependency_status: dependency.is_ok(),
            error: dependency.as_ref().err().map(ToString::to_string),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.dependency_status
    }
}

/// Render a duration as hours/minutes/seconds with millisecond precision.
pub fn format_uptime(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if millis > 0 {
        out.push_str(&format!("{}.{:03}s", seconds, millis));
    } else {
        out.push_str(&format!("{}s", seconds));
    }
    out
}
