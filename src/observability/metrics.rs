//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method and status
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_dispatch_total` (counter): selections per backend
//! - `proxy_no_backend_total` (counter): requests with no live backend
//! - `proxy_backend_alive` (gauge): 1=alive, 0=dead
//!
//! All recording functions are no-ops until [`init_metrics`] installs the
//! Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("proxy_requests_total", Unit::Count, "Requests handled by the proxy");
    describe_histogram!(
        "proxy_request_duration_seconds",
        Unit::Seconds,
        "Time from request arrival to response headers"
    );
    describe_counter!("proxy_dispatch_total", Unit::Count, "Requests dispatched per backend");
    describe_counter!("proxy_no_backend_total", Unit::Count, "Requests rejected with no live backend");
    describe_gauge!("proxy_backend_alive", "Backend liveness (1=alive, 0=dead)");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed client request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a backend selection.
pub fn record_dispatch(backend: &str) {
    counter!("proxy_dispatch_total", "backend" => backend.to_string()).increment(1);
}

/// Record a request that found no live backend.
pub fn record_no_backend() {
    counter!("proxy_no_backend_total").increment(1);
}

/// Record the liveness of a backend.
pub fn record_backend_alive(backend: &str, alive: bool) {
    gauge!("proxy_backend_alive", "backend" => backend.to_string()).set(if alive { 1.0 } else { 0.0 });
}
