//! Dispatch error taxonomy.
//!
//! Construction-time variants (`EmptyPool`, `InvalidAddress`) are fatal and
//! stop the proxy from starting. Per-request variants are turned into a
//! response for that request only.

use std::time::Duration;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatcher was given no backends.
    #[error("backend pool is empty")]
    EmptyPool,

    /// A configured backend address could not be parsed.
    #[error("invalid backend address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Every backend in the pool reported not alive.
    #[error("no backend available")]
    NoBackendAvailable,

    /// The upstream connection or transfer failed.
    #[error("forwarding to {address} failed: {reason}")]
    ForwardFailure { address: String, reason: String },

    /// The upstream did not answer in time.
    #[error("upstream {address} timed out after {after:?}")]
    UpstreamTimeout { address: String, after: Duration },
}

impl DispatchError {
    /// Status code sent to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoBackendAvailable => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::ForwardFailure { .. } => StatusCode::BAD_GATEWAY,
            DispatchError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DispatchError::EmptyPool | DispatchError::InvalidAddress { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let message = match &self {
            DispatchError::NoBackendAvailable => "No backend available",
            DispatchError::ForwardFailure { .. } => "Upstream request failed",
            DispatchError::UpstreamTimeout { .. } => "Upstream request timed out",
            DispatchError::EmptyPool | DispatchError::InvalidAddress { .. } => {
                "Proxy misconfigured"
            }
        };
        (self.status(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DispatchError::NoBackendAvailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            DispatchError::ForwardFailure { address: "http://a".into(), reason: "refused".into() }.status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            DispatchError::UpstreamTimeout { address: "http://a".into(), after: Duration::from_secs(1) }.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(DispatchError::EmptyPool.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = DispatchError::NoBackendAvailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_display() {
        let err = DispatchError::InvalidAddress {
            address: "ftp://x".into(),
            reason: "unsupported scheme".into(),
        };
        assert_eq!(err.to_string(), "invalid backend address \"ftp://x\": unsupported scheme");
    }
}
