//! Metrics collection and exposition.
//!
//! # Metrics
//! - `prpl_requests_total` (counter): requests by status code
//! - `prpl_request_duration_seconds` (histogram): time to response head
//! - `prpl_build_selected_total` (counter): selections by build name
//! - `prpl_unsupported_total` (counter): clients no build accepts
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter,
//!   so tests and library users pay nothing
//! - Labels are low-cardinality: status code and configured build name

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("prpl_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("prpl_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_build(build: &str) {
    metrics::counter!("prpl_build_selected_total", "build" => build.to_string()).increment(1);
}

pub fn record_unsupported() {
    metrics::counter!("prpl_unsupported_total").increment(1);
}
