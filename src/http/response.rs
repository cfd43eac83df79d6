//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the backend response to the client unchanged
//! - Strip hop-by-hop headers
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Upstream error statuses are passed through, never reinterpreted
//! - Transport failures map to 502, backend timeouts to 504 (see `DispatchError`)

use axum::body::{Body, Bytes, HttpBody};
use axum::http::Response;
use axum::BoxError;

use crate::http::request::strip_hop_by_hop;

/// Convert an upstream response into the response sent to the client.
pub fn relay<B>(response: Response<B>) -> Response<Body>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
