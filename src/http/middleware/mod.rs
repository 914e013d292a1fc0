//! Request middleware chain.
//!
//! # Data Flow
//! ```text
//! request
//!     → metrics.rs      (outermost: full latency, final status)
//!     → correlation.rs  (assign x-request-id, RequestContext)
//!     → access_log.rs   (one event per request, reads the id)
//!     → api_version.rs  (stamp x-api-version)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Order is fixed by [`Interceptor`]'s declaration order, not by the order
//!   the builder is called in
//! - Any interceptor can be left out; the rest keep working (a missing
//!   correlation id is logged as `""`)
//! - Interceptors never short-circuit; handlers write their own errors

pub mod access_log;
pub mod api_version;
pub mod correlation;
pub mod metrics;

use std::collections::BTreeSet;

use axum::{middleware, Router};

use crate::config::ServiceConfig;
use crate::http::request::ApiVersion;

pub use self::metrics::MetricsOptions;

/// Cross-cutting request behaviours, declared outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interceptor {
    Metrics,
    CorrelationId,
    AccessLog,
    ApiVersion,
}

impl Interceptor {
    /// Every interceptor, in chain order.
    pub const ALL: [Interceptor; 4] = [
        Interceptor::Metrics,
        Interceptor::CorrelationId,
        Interceptor::AccessLog,
        Interceptor::ApiVersion,
    ];
}

/// An ordered, immutable set of interceptors ready to wrap a router.
#[derive(Debug, Clone)]
pub struct MiddlewareChain {
    interceptors: Vec<Interceptor>,
    api_version: ApiVersion,
    metrics: MetricsOptions,
}

impl MiddlewareChain {
    /// Start from the full chain.
    pub fn builder(api_version: impl Into<String>) -> MiddlewareChainBuilder {
        MiddlewareChainBuilder {
            enabled: Interceptor::ALL.into_iter().collect(),
            api_version: ApiVersion(api_version.into()),
            metrics: MetricsOptions::default(),
        }
    }

    /// Chain described by the service configuration.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let mut builder = Self::builder(config.api_version.clone())
            .label_request_id(config.observability.metrics_label_request_id);
        if !config.observability.metrics_enabled {
            builder = builder.without(Interceptor::Metrics);
        }
        builder.build()
    }

    /// Interceptors in the order a request passes through them.
    pub fn interceptors(&self) -> &[Interceptor] {
        &self.interceptors
    }

    pub fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Wrap every route (and the fallback) of `router`.
    pub fn apply(&self, router: Router) -> Router {
        // Each `layer` call wraps everything added before it, so the
        // innermost interceptor must be applied first.
        self.interceptors
            .iter()
            .rev()
            .fold(router, |router, interceptor| match interceptor {
                Interceptor::Metrics => router.layer(middleware::from_fn_with_state(
                    self.metrics,
                    self::metrics::track_metrics,
                )),
                Interceptor::CorrelationId => {
                    router.layer(middleware::from_fn(correlation::assign_correlation_id))
                }
                Interceptor::AccessLog => router.layer(middleware::from_fn(access_log::log_access)),
                Interceptor::ApiVersion => router.layer(middleware::from_fn_with_state(
                    self.api_version.clone(),
                    api_version::inject_api_version,
                )),
            })
    }
}

/// Builder for [`MiddlewareChain`].
#[derive(Debug, Clone)]
pub struct MiddlewareChainBuilder {
    enabled: BTreeSet<Interceptor>,
    api_version: ApiVersion,
    metrics: MetricsOptions,
}

impl MiddlewareChainBuilder {
    pub fn with(mut self, interceptor: Interceptor) -> Self {
        self.enabled.insert(interceptor);
        self
    }

    pub fn without(mut self, interceptor: Interceptor) -> Self {
        self.enabled.remove(&interceptor);
        self
    }

    pub fn label_request_id(mut self, enabled: bool) -> Self {
        self.metrics.label_request_id = enabled;
        self
    }

    pub fn build(self) -> MiddlewareChain {
        MiddlewareChain {
            // BTreeSet iterates in declaration order, which is chain order.
            interceptors: self.enabled.into_iter().collect(),
            api_version: self.api_version,
            metrics: self.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::{RequestIdExt, X_API_VERSION, X_REQUEST_ID};
    use crate::observability;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use std::collections::HashSet;
    use tower::ServiceExt;

    /// Echoes what the handler saw: correlation id and version tag.
    async fn echo(request: Request<Body>) -> String {
        let version = request
            .api_version()
            .map(|v| v.as_str().to_string())
            .unwrap_or_default();
        format!("{}|{}", request.request_id(), version)
    }

    async fn boom() -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    fn router(chain: &MiddlewareChain) -> Router {
        chain.apply(
            Router::new()
                .route("/echo", get(echo))
                .route("/teapot", get(boom)),
        )
    }

    async fn call(router: &Router, request: Request<Body>) -> (axum::http::response::Parts, String) {
        let response = router.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        (parts, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn order_is_canonical_regardless_of_builder_calls() {
        let chain = MiddlewareChain::builder("v1")
            .without(Interceptor::Metrics)
            .without(Interceptor::AccessLog)
            .with(Interceptor::AccessLog)
            .with(Interceptor::Metrics)
            .build();
        assert_eq!(chain.interceptors(), &Interceptor::ALL);
    }

    #[test]
    fn from_config_drops_metrics_when_disabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_enabled = false;
        let chain = MiddlewareChain::from_config(&config);
        assert_eq!(
            chain.interceptors(),
            &[
                Interceptor::CorrelationId,
                Interceptor::AccessLog,
                Interceptor::ApiVersion
            ]
        );
    }

    #[tokio::test]
    async fn handler_sees_same_id_as_response_header() {
        let router = router(&MiddlewareChain::builder("v3").build());

        let (parts, body) = call(&router, get_request("/echo")).await;
        let header_id = parts.headers[X_REQUEST_ID].to_str().unwrap().to_string();

        assert_eq!(body, format!("{}|v3", header_id));
        assert_eq!(parts.headers[X_API_VERSION], "v3");
    }

    #[tokio::test]
    async fn inbound_request_id_is_reused() {
        let router = router(&MiddlewareChain::builder("v1").build());
        let request = Request::builder()
            .uri("/echo")
            .header("x-request-id", "upstream-abc")
            .body(Body::empty())
            .unwrap();

        let (parts, body) = call(&router, request).await;
        assert_eq!(parts.headers[X_REQUEST_ID], "upstream-abc");
        assert_eq!(body, "upstream-abc|v1");
    }

    #[tokio::test]
    async fn inbound_api_version_is_overwritten() {
        let router = router(&MiddlewareChain::builder("v2").build());
        let request = Request::builder()
            .uri("/echo")
            .header("x-api-version", "v99")
            .body(Body::empty())
            .unwrap();

        let (parts, body) = call(&router, request).await;
        assert_eq!(parts.headers[X_API_VERSION], "v2");
        assert!(body.ends_with("|v2"));
    }

    #[tokio::test]
    async fn concurrent_requests_get_unique_ids() {
        let router = router(&MiddlewareChain::builder("v1").build());

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let router = router.clone();
                tokio::spawn(async move { call(&router, get_request("/echo")).await })
            })
            .collect();

        let mut seen = HashSet::new();
        for task in tasks {
            let (parts, body) = task.await.unwrap();
            let header_id = parts.headers[X_REQUEST_ID].to_str().unwrap().to_string();
            assert!(body.starts_with(&header_id));
            assert!(seen.insert(header_id), "correlation ids must be unique");
        }
        assert_eq!(seen.len(), 50);
    }

    #[tokio::test]
    async fn disabled_correlation_leaves_empty_id() {
        observability::metrics::init_recorder().unwrap();
        let chain = MiddlewareChain::builder("v1")
            .without(Interceptor::CorrelationId)
            .label_request_id(true)
            .build();
        let router = router(&chain);

        let (parts, body) = call(&router, get_request("/teapot")).await;
        assert_eq!(parts.status, StatusCode::IM_A_TEAPOT);
        assert!(parts.headers.get(X_REQUEST_ID).is_none());

        let (_, body_echo) = call(&router, get_request("/echo")).await;
        assert_eq!(body_echo, "|v1");
        assert!(body.is_empty());

        let rendered = observability::metrics::render();
        assert!(rendered
            .lines()
            .any(|line| line.contains(r#"path="/teapot""#) && line.contains(r#"status="418""#)));
    }

    #[tokio::test]
    async fn metrics_label_matches_response_header() {
        observability::metrics::init_recorder().unwrap();
        let chain = MiddlewareChain::builder("v1").label_request_id(true).build();
        let router = chain.apply(Router::new().route("/labelled", get(|| async { "ok" })));

        let (parts, _) = call(&router, get_request("/labelled")).await;
        let header_id = parts.headers[X_REQUEST_ID].to_str().unwrap();

        let rendered = observability::metrics::render();
        assert!(rendered.contains(&format!(r#"request_id="{}""#, header_id)));
    }

    #[tokio::test]
    async fn unmatched_paths_share_one_label() {
        observability::metrics::init_recorder().unwrap();
        let chain = MiddlewareChain::builder("v1").build();
        let router = chain.apply(Router::new().route("/known", get(|| async { "ok" })));

        for i in 0..5 {
            let (parts, _) = call(&router, get_request(&format!("/scan/{}-abc", i))).await;
            assert_eq!(parts.status, StatusCode::NOT_FOUND);
        }

        let rendered = observability::metrics::render();
        assert!(!rendered.contains("/scan/"), "raw paths must not become labels");
        assert!(rendered.lines().any(|line| line.starts_with("http_requests_total")
            && line.contains(&format!(r#"path="{}""#, super::metrics::UNMATCHED_PATH))
            && line.contains(r#"status="404""#)));
    }

    #[tokio::test]
    async fn status_defaults_to_200_and_is_recorded() {
        observability::metrics::init_recorder().unwrap();
        let chain = MiddlewareChain::builder("v1").build();
        let router = chain.apply(Router::new().route("/implicit", get(|| async { "body only" })));

        let (parts, _) = call(&router, get_request("/implicit")).await;
        assert_eq!(parts.status, StatusCode::OK);

        let rendered = observability::metrics::render();
        assert!(rendered
            .lines()
            .any(|line| line.starts_with("http_requests_total")
                && line.contains(r#"path="/implicit""#)
                && line.contains(r#"status="200""#)));
    }
}
