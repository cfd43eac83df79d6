//! Backend pool construction.
//!
//! # Responsibilities
//! - Build one `HttpBackend` per configured address, in order
//! - Reject an empty or malformed pool before anything is served
//! - Hand the same backends to the dispatcher and to health checking

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::http::client::{build_upstream_client, UpstreamClient};
use crate::load_balancer::{Backend, DispatchError, Dispatcher, HttpBackend};

/// The configured set of HTTP backends.
#[derive(Debug, Clone)]
pub struct BackendPool {
    backends: Vec<Arc<HttpBackend>>,
}

impl BackendPool {
    /// Create a pool from configuration, sharing one upstream client.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, DispatchError> {
        let client = build_upstream_client(&config.timeouts);
        let addresses: Vec<&str> = config.backends.iter().map(|b| b.address.as_str()).collect();
        Self::new(
            &addresses,
            client,
            Duration::from_secs(config.timeouts.request_secs),
        )
    }

    /// Create a pool from a list of addresses.
    pub fn new(
        addresses: &[&str],
        client: UpstreamClient,
        request_timeout: Duration,
    ) -> Result<Self, DispatchError> {
        if addresses.is_empty() {
            return Err(DispatchError::EmptyPool);
        }

        let backends = addresses
            .iter()
            .map(|address| {
                HttpBackend::new(address, client.clone(), request_timeout).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (index, backend) in backends.iter().enumerate() {
            tracing::debug!(index, address = %backend.address(), "Backend registered");
        }

        Ok(Self { backends })
    }

    /// Backends in rotation order.
    pub fn backends(&self) -> &[Arc<HttpBackend>] {
        &self.backends
    }

    /// Build a dispatcher rotating over this pool.
    pub fn dispatcher(&self) -> Result<Dispatcher, DispatchError> {
        let backends = self
            .backends
            .iter()
            .map(|b| b.clone() as Arc<dyn Backend>)
            .collect();
        Dispatcher::new(backends)
    }
}
