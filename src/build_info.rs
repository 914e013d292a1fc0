//! Build metadata baked in at compile time.
//!
//! CI sets `BUILD_TIME`, `GIT_COMMIT_HASH`, `GIT_COMMIT_USER`,
//! `GIT_COMMIT_TIME` and optionally `API_VERSION` in the environment of
//! `cargo build`; local builds report `unknown`.

use serde::Serialize;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const API_VERSION: &str = match option_env!("API_VERSION") {
    Some(v) => v,
    None => "v1",
};

pub const BUILD_TIME: &str = or_unknown(option_env!("BUILD_TIME"));
pub const GIT_COMMIT_HASH: &str = or_unknown(option_env!("GIT_COMMIT_HASH"));
pub const GIT_COMMIT_USER: &str = or_unknown(option_env!("GIT_COMMIT_USER"));
pub const GIT_COMMIT_TIME: &str = or_unknown(option_env!("GIT_COMMIT_TIME"));

const fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(v) => v,
        None => "unknown",
    }
}

/// Body of `GET /api/version`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub app_name: &'static str,
    pub version: &'static str,
    pub api_version: String,
    pub build_time: &'static str,
    pub git_commit_hash: &'static str,
    pub git_commit_user: &'static str,
    pub git_commit_time: &'static str,
}

impl BuildInfo {
    /// Build metadata for this binary, advertising `api_version`.
    pub fn current(api_version: impl Into<String>) -> Self {
        Self {
            app_name: APP_NAME,
            version: APP_VERSION,
            api_version: api_version.into(),
            build_time: BUILD_TIME,
            git_commit_hash: GIT_COMMIT_HASH,
            git_commit_user: GIT_COMMIT_USER,
            git_commit_time: GIT_COMMIT_TIME,
        }
    }
}
