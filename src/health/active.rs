//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Update backend liveness based on results

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::http::client::UpstreamClient;
use crate::http::request::upstream_uri;
use crate::load_balancer::{Backend, HttpBackend};
use crate::observability::metrics;

pub struct HealthMonitor {
    backends: Vec<Arc<HttpBackend>>,
    config: HealthCheckConfig,
    client: UpstreamClient,
}

impl HealthMonitor {
    pub fn new(backends: Vec<Arc<HttpBackend>>, config: HealthCheckConfig, client: UpstreamClient) -> Self {
        Self {
            backends,
            config,
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            backends = self.backends.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once, concurrently.
    pub async fn check_all(&self) {
        let probes = self.backends.iter().map(|backend| self.check(backend));
        futures_util::future::join_all(probes).await;
    }

    async fn check(&self, backend: &HttpBackend) {
        let address = backend.address();
        let healthy = self.probe(backend).await;

        let liveness = backend.liveness();
        if healthy {
            if liveness.mark_success(self.config.healthy_threshold as usize) {
                tracing::info!(backend = %address, "Backend is alive again");
            }
        } else if liveness.mark_failure(self.config.unhealthy_threshold as usize) {
            tracing::warn!(backend = %address, "Backend marked dead");
        }

        metrics::record_backend_alive(address, backend.is_alive());
    }

    async fn probe(&self, backend: &HttpBackend) -> bool {
        let address = backend.address();
        let path = match self.config.path.parse() {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(path = %self.config.path, error = %e, "Invalid health check path");
                return false;
            }
        };

        let request = match upstream_uri(backend.target(), &path).and_then(|uri| {
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::USER_AGENT, "roundrobin-proxy-health-check")
                .body(Body::empty())
        }) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %address, error = %e, "Failed to build health check request");
                return false;
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::debug!(backend = %address, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::debug!(backend = %address, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(backend = %address, "Health check failed: timeout");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use crate::http::client::build_upstream_client;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal upstream answering every request with `status`.
    async fn upstream(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response = format!("HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status);
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    fn monitor(addresses: &[String], config: HealthCheckConfig) -> HealthMonitor {
        let client = build_upstream_client(&TimeoutConfig::default());
        let backends = addresses
            .iter()
            .map(|a| Arc::new(HttpBackend::new(a, client.clone(), Duration::from_secs(5)).unwrap()))
            .collect();
        HealthMonitor::new(backends, config, client)
    }

    #[tokio::test]
    async fn test_failing_backend_marked_dead_after_threshold() {
        let good = upstream("200 OK").await;
        let bad = upstream("500 Internal Server Error").await;
        let config = HealthCheckConfig {
            enabled: true,
            unhealthy_threshold: 2,
            healthy_threshold: 1,
            ..HealthCheckConfig::default()
        };
        let m = monitor(&[good, bad], config);

        m.check_all().await;
        assert!(m.backends[0].is_alive());
        assert!(m.backends[1].is_alive());

        m.check_all().await;
        assert!(m.backends[0].is_alive());
        assert!(!m.backends[1].is_alive());
    }

    #[tokio::test]
    async fn test_dead_backend_recovers() {
        let good = upstream("200 OK").await;
        let config = HealthCheckConfig {
            enabled: true,
            healthy_threshold: 2,
            ..HealthCheckConfig::default()
        };
        let m = monitor(&[good], config);
        m.backends[0].liveness().set_alive(false);

        m.check_all().await;
        assert!(!m.backends[0].is_alive());
        m.check_all().await;
        assert!(m.backends[0].is_alive());
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown() {
        let good = upstream("200 OK").await;
        let config = HealthCheckConfig {
            enabled: true,
            interval_secs: 1,
            ..HealthCheckConfig::default()
        };
        let m = monitor(&[good], config);

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(m.run(rx));
        tx.send(()).unwrap();
        time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }
}
