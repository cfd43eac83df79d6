//! Round-robin dispatcher.
//!
//! Holds the ordered backend pool and the rotation cursor. Selection walks
//! the pool from the cursor, skipping dead backends, and moves the cursor
//! one past the backend it picked. A backend that comes back to life
//! re-enters the rotation at its original position.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::load_balancer::{Backend, DispatchError};
use crate::observability::metrics;

/// Selects a live backend per request and forwards the request to it.
#[derive(Debug)]
pub struct Dispatcher {
    backends: Vec<Arc<dyn Backend>>,
    /// Next rotation position, always `< backends.len()`.
    cursor: AtomicUsize,
}

impl Dispatcher {
    /// Create a dispatcher over a fixed, ordered pool.
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Result<Self, DispatchError> {
        if backends.is_empty() {
            return Err(DispatchError::EmptyPool);
        }
        Ok(Self {
            backends,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Backends in rotation order.
    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Current rotation position.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Pick the next live backend.
    ///
    /// Scans at most `len()` positions. The cursor is only moved by a
    /// successful compare-exchange, so concurrent callers each claim a
    /// distinct run of rotation steps. When every backend is dead the cursor
    /// is left untouched and `NoBackendAvailable` is returned.
    pub fn select_next(&self) -> Result<Arc<dyn Backend>, DispatchError> {
        let len = self.backends.len();
        let mut current = self.cursor.load(Ordering::Acquire);

        loop {
            let index = (0..len)
                .map(|offset| (current + offset) % len)
                .find(|&index| self.backends[index].is_alive())
                .ok_or(DispatchError::NoBackendAvailable)?;

            let next = (index + 1) % len;
            match self.cursor.compare_exchange_weak(
                current, next, Ordering::AcqRel, Ordering::Acquire
            ) {
                Ok(_) => return Ok(self.backends[index].clone()),
                Err(observed) => current = observed,
            }
        }
    }

    /// Select a backend and forward the request to it.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response, DispatchError> {
        let backend = match self.select_next() {
            Ok(backend) => backend,
            Err(e) => {
                metrics::record_no_backend();
                return Err(e);
            }
        };

        tracing::info!(backend = %backend.address(), "Forwarding request");
        metrics::record_dispatch(backend.address());

        backend.forward(request).await
    }
}
