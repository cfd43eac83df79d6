//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → [dispatcher picks a backend]
//!     → request.rs (rewrite URI, strip hop-by-hop, X-Forwarded-*)
//!     → client.rs (send upstream)
//!     → response.rs (strip hop-by-hop, stream body)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
