//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum router with the probe and metadata handlers
//! - Wire up middleware (panic recovery, request timeout, interceptor chain)
//! - Bind the router to a listener on a background task
//! - Stop accepting and drain on request, within a deadline

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::build_info::BuildInfo;
use crate::config::ServiceConfig;
use crate::health::DependencyProbe;
use crate::http::handlers;
use crate::http::in_flight::{track_in_flight, InFlightTracker};
use crate::http::middleware::MiddlewareChain;
use crate::http::response::ApiError;
use crate::lifecycle::shutdown::{Shutdown, ShutdownError};
use crate::lifecycle::state::Lifecycle;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Lifecycle,
    pub probe: Arc<dyn DependencyProbe>,
    pub probe_timeout: Duration,
    pub started_at: Instant,
    pub build_info: Arc<BuildInfo>,
}

/// HTTP server for the probe and metadata endpoints.
pub struct HttpServer {
    router: Router,
    in_flight: InFlightTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig, lifecycle: Lifecycle, probe: Arc<dyn DependencyProbe>) -> Self {
        Self::with_routes(config, lifecycle, probe, Router::new())
    }

    /// Like [`HttpServer::new`], mounting `extra` routes next to the built-in
    /// ones. They go through the same middleware.
    pub fn with_routes(
        config: &ServiceConfig,
        lifecycle: Lifecycle,
        probe: Arc<dyn DependencyProbe>,
        extra: Router,
    ) -> Self {
        let state = AppState {
            lifecycle,
            probe,
            probe_timeout: config.dependency.timeout(),
            started_at: Instant::now(),
            build_info: Arc::new(BuildInfo::current(config.api_version.clone())),
        };

        let in_flight = InFlightTracker::new();
        let router = Self::build_router(config, state, extra, &in_flight);
        Self { router, in_flight }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        extra: Router,
        in_flight: &InFlightTracker,
    ) -> Router {
        let mut routes = Router::new()
            .route("/api/version", get(handlers::version))
            .route("/api/health", get(handlers::healthz))
            .route("/api/ready", get(handlers::readyz));
        if config.observability.metrics_enabled {
            routes = routes.route("/metrics", get(handlers::prometheus));
        }

        // Panics are turned into a 500 inside the interceptor chain, so the
        // access log and metrics still see the request.
        let app = routes
            .with_state(state)
            .merge(extra)
            .fallback(handlers::not_found)
            .method_not_allowed_fallback(handlers::method_not_allowed)
            .layer(
                ServiceBuilder::new()
                    .layer(CatchPanicLayer::custom(panic_response))
                    .layer(TimeoutLayer::new(config.http.request_timeout())),
            );

        MiddlewareChain::from_config(config)
            .apply(app)
            .layer(middleware::from_fn_with_state(in_flight.clone(), track_in_flight))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Start serving on `listener` in the background.
    pub fn spawn(self, listener: TcpListener) -> io::Result<RunningServer> {
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "HTTP server starting");

        let stop = Shutdown::new();
        let mut signal = stop.subscribe();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.wait().await })
                .await
        });

        Ok(RunningServer {
            local_addr,
            stop,
            task,
            in_flight: self.in_flight,
        })
    }
}

fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

/// Handle to a server started with [`HttpServer::spawn`].
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    stop: Shutdown,
    task: JoinHandle<io::Result<()>>,
    in_flight: InFlightTracker,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Requests currently being handled.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.count()
    }

    /// Stop accepting connections and wait up to `timeout` for in-flight
    /// requests. The serve loop is aborted if the deadline passes.
    pub async fn shutdown(self, timeout: Duration) -> Result<(), ShutdownError> {
        self.stop.trigger();
        let abort = self.task.abort_handle();

        match tokio::time::timeout(timeout, self.task).await {
            Ok(joined) => {
                joined??;
                tracing::info!("HTTP server stopped");
                Ok(())
            }
            Err(_) => {
                abort.abort();
                tracing::warn!(
                    timeout = ?timeout,
                    in_flight = self.in_flight.count(),
                    "HTTP server did not drain in time"
                );
                Err(ShutdownError::Timeout(timeout))
            }
        }
    }
}
