//! Concrete dependency probes.
//!
//! # Responsibilities
//! - TCP connect check (the equivalent of a database ping)
//! - HTTP GET check against a health URL
//! - A no-op probe for deployments without a dependency

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

use crate::config::{DependencyConfig, DependencyKind};
use crate::health::probe::{DependencyError, DependencyProbe};

/// Build the probe described by `config`.
pub fn from_config(config: &DependencyConfig) -> Result<Arc<dyn DependencyProbe>, DependencyError> {
    let probe: Arc<dyn DependencyProbe> = match config.kind {
        DependencyKind::None => Arc::new(NoopProbe),
        DependencyKind::Tcp => Arc::new(TcpProbe::new(config.address.clone())),
        DependencyKind::Http => Arc::new(HttpProbe::new(&config.address)?),
    };
    Ok(probe)
}

/// Always alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

#[async_trait]
impl DependencyProbe for NoopProbe {
    fn name(&self) -> &str {
        "none"
    }

    async fn check_alive(&self, _deadline: Instant) -> Result<(), DependencyError> {
        Ok(())
    }
}

/// Alive when a TCP connection to `address` can be opened.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl DependencyProbe for TcpProbe {
    fn name(&self) -> &str {
        "tcp"
    }

    async fn check_alive(&self, deadline: Instant) -> Result<(), DependencyError> {
        match time::timeout_at(deadline, TcpStream::connect(&self.address)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(DependencyError::Unreachable(format!("{}: {}", self.address, e))),
            Err(_) => Err(DependencyError::Unreachable(format!(
                "{}: connect timed out",
                self.address
            ))),
        }
    }
}

/// Alive when `GET uri` answers with a 2xx status.
#[derive(Clone)]
pub struct HttpProbe {
    uri: Uri,
    client: Client<HttpConnector, Body>,
}

impl HttpProbe {
    pub fn new(address: &str) -> Result<Self, DependencyError> {
        let uri: Uri = address
            .parse()
            .map_err(|e| DependencyError::Unreachable(format!("invalid URL '{}': {}", address, e)))?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { uri, client })
    }
}

impl std::fmt::Debug for HttpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProbe").field("uri", &self.uri).finish()
    }
}

#[async_trait]
impl DependencyProbe for HttpProbe {
    fn name(&self) -> &str {
        "http"
    }

    async fn check_alive(&self, deadline: Instant) -> Result<(), DependencyError> {
        let request = Request::builder()
            .method("GET")
            .uri(self.uri.clone())
            .header("user-agent", concat!(env!("CARGO_PKG_NAME"), "-health-check"))
            .body(Body::empty())
            .map_err(|e| DependencyError::Unreachable(e.to_string()))?;

        match time::timeout_at(deadline, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(DependencyError::Unhealthy(format!(
                "{} answered {}",
                self.uri,
                response.status()
            ))),
            Ok(Err(e)) => Err(DependencyError::Unreachable(format!("{}: {}", self.uri, e))),
            Err(_) => Err(DependencyError::Unreachable(format!("{}: request timed out", self.uri))),
        }
    }
}
