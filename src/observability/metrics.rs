//! Metrics recording.
//!
//! # Metrics
//! - `dispatcher_requests_total` (counter): completed requests by endpoint, method, status
//! - `dispatcher_request_duration_seconds` (histogram): per-request latency by endpoint
//! - `dispatcher_transport_errors_total` (counter): failed exchanges
//! - `dispatcher_pool_jobs_total` (counter): jobs handed to the worker pool

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install a Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &str, method: &str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "dispatcher_requests_total",
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "dispatcher_request_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_transport_error() {
    metrics::counter!("dispatcher_transport_errors_total").increment(1);
}

pub fn record_job_scheduled() {
    metrics::counter!("dispatcher_pool_jobs_total").increment(1);
}
