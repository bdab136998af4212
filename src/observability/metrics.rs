//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxied requests by method, status, route class
//! - `gateway_request_duration_seconds` (histogram): end-to-end proxy latency
//! - `gateway_rate_limited_total` (counter): 429 rejections by route class
//! - `gateway_upstream_errors_total` (counter): failed forwards by kind
//! - `gateway_rate_limit_keys` (gauge): windows currently tracked
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, class: &str, start: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "class" => class.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "class" => class.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(class: &str) {
    ::metrics::counter!("gateway_rate_limited_total", "class" => class.to_string()).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_tracked_keys(count: usize) {
    ::metrics::gauge!("gateway_rate_limit_keys").set(count as f64);
}
