//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at the proxy handler
//!     → dispatcher.rs (select next live backend, advance cursor)
//!     → backend.rs (forward to upstream, relay response)
//!     → Response, or DispatchError mapped to 502/503/504
//! ```
//!
//! # Design Decisions
//! - Pool is fixed at startup; order defines rotation order
//! - Rotation cursor is owned by the dispatcher, updated lock-free
//! - Dead backends skipped; the scan is bounded by the pool size
//! - No retry, ejection or circuit breaking on forwarding failure

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod pool;

pub use backend::{Backend, HttpBackend};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use pool::BackendPool;
