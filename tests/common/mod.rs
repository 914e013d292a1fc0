//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

use service_template::config::ServiceConfig;
use service_template::health::{DependencyError, DependencyProbe};
use service_template::http::{HttpServer, RunningServer};
use service_template::lifecycle::Lifecycle;

/// Config suitable for tests: loopback, OS-assigned port, no drain sleep.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.http.host = "127.0.0.1".to_string();
    config.http.port = 0;
    config.shutdown.drain_sleep_secs = 0;
    config.shutdown.graceful_timeout_secs = 5;
    config.dependency.timeout_secs = 1;
    config.debug = true;
    config
}

/// Probe with a fixed answer.
pub struct StaticProbe(pub Result<(), DependencyError>);

#[async_trait]
impl DependencyProbe for StaticProbe {
    fn name(&self) -> &str {
        "static"
    }

    async fn check_alive(&self, _deadline: Instant) -> Result<(), DependencyError> {
        self.0.clone()
    }
}

pub fn ok_probe() -> Arc<dyn DependencyProbe> {
    Arc::new(StaticProbe(Ok(())))
}

pub fn failing_probe(reason: &str) -> Arc<dyn DependencyProbe> {
    Arc::new(StaticProbe(Err(DependencyError::Unreachable(reason.to_string()))))
}

/// Probe that never answers and ignores its deadline.
pub struct HangingProbe;

#[async_trait]
impl DependencyProbe for HangingProbe {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn check_alive(&self, _deadline: Instant) -> Result<(), DependencyError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Bind on an OS-assigned loopback port and start serving.
pub async fn spawn_server(
    config: &ServiceConfig,
    lifecycle: Lifecycle,
    probe: Arc<dyn DependencyProbe>,
    extra: Router,
) -> RunningServer {
    let listener = TcpListener::bind(config.http.bind_address()).await.unwrap();
    HttpServer::with_routes(config, lifecycle, probe, extra)
        .spawn(listener)
        .unwrap()
}

/// Client with no pooling or proxy so each test sees fresh connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

/// Start a programmable HTTP backend on a free port and return its address.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                // Read (and ignore) the request head before answering.
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    204 => "204 No Content",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Install a JSON subscriber writing here for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Lines whose message contains `message`.
    pub fn matching(&self, message: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(message))
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
