//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream target
//! - Answer liveness and address queries
//! - Hand a request off to the upstream and relay its response

use std::fmt;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use url::Url;

use crate::health::state::Liveness;
use crate::http::client::UpstreamClient;
use crate::http::{request, response};
use crate::load_balancer::DispatchError;

/// Capability set of an upstream target.
///
/// The dispatcher only reads liveness; it never writes it. Implementations
/// other than [`HttpBackend`] (weighted, circuit-broken, test doubles) can be
/// handed to the dispatcher without changing it.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Immutable identifier of the upstream.
    fn address(&self) -> &str;

    /// Current liveness.
    fn is_alive(&self) -> bool;

    /// Proxy the request to the upstream.
    ///
    /// Upstream responses are returned as-is whatever their status. Only
    /// transport failures produce an error, and they are never retried.
    fn forward(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response, DispatchError>>;
}

/// A backend reached over HTTP(S).
pub struct HttpBackend {
    address: String,
    target: Url,
    liveness: Liveness,
    client: UpstreamClient,
    request_timeout: Duration,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("address", &self.address)
            .field("state", &self.liveness.state())
            .finish()
    }
}

/// Parse and check a backend address.
pub fn parse_address(address: &str) -> Result<Url, DispatchError> {
    let invalid = |reason: String| DispatchError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {:?}", other))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

impl HttpBackend {
    /// Create a new backend. Fails if the address is not an http(s) URL.
    pub fn new(
        address: &str,
        client: UpstreamClient,
        request_timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let target = parse_address(address)?;
        Ok(Self {
            address: address.to_string(),
            target,
            liveness: Liveness::new(),
            client,
            request_timeout,
        })
    }

    /// Parsed base URL.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Liveness handle for health collaborators.
    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    async fn send(&self, request: Request<Body>) -> Result<Response, DispatchError> {
        let outbound = request::prepare_upstream_request(request, &self.target).map_err(|e| {
            DispatchError::ForwardFailure {
                address: self.address.clone(),
                reason: e.to_string(),
            }
        })?;

        match tokio::time::timeout(self.request_timeout, self.client.request(outbound)).await {
            Ok(Ok(upstream)) => Ok(response::relay(upstream)),
            Ok(Err(e)) => Err(DispatchError::ForwardFailure {
                address: self.address.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(DispatchError::UpstreamTimeout {
                address: self.address.clone(),
                after: self.request_timeout,
            }),
        }
    }
}

impl Backend for HttpBackend {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    fn forward(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response, DispatchError>> {
        Box::pin(self.send(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use crate::http::client::build_upstream_client;

    fn backend(address: &str) -> Result<HttpBackend, DispatchError> {
        let client = build_upstream_client(&TimeoutConfig::default());
        HttpBackend::new(address, client, Duration::from_secs(1))
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address("http://127.0.0.1:8080").is_ok());
        assert!(parse_address("https://www.bing.com").is_ok());
        assert!(matches!(
            parse_address("127.0.0.1:8080"),
            Err(DispatchError::InvalidAddress { .. })
        ));
        assert!(matches!(
            parse_address("ftp://files.example.com"),
            Err(DispatchError::InvalidAddress { .. })
        ));
        assert!(matches!(
            parse_address("not a url"),
            Err(DispatchError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_backend_liveness() {
        let b = backend("http://127.0.0.1:8080").unwrap();
        assert_eq!(b.address(), "http://127.0.0.1:8080");
        assert!(b.is_alive());

        b.liveness().set_alive(false);
        assert!(!b.is_alive());
    }

    #[tokio::test]
    async fn test_forward_to_closed_port_fails() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let b = backend(&format!("http://{}", addr)).unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let err = b.forward(request).await.unwrap_err();
        assert!(matches!(err, DispatchError::ForwardFailure { .. }));
        // Forwarding failures never touch liveness.
        assert!(b.is_alive());
    }
}
