//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stream_requests_total` (counter): responses by status
//! - `stream_request_duration_seconds` (histogram): handler latency
//! - `stream_exchanges_total` (counter): exchange outcomes
//! - `stream_pending_exchanges` (gauge): open correlation entries
//! - `stream_connected_peers` (gauge): connected controlling clients
//! - `stream_bytes_served_total` (counter): partial content bytes
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("stream_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("stream_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_exchange(outcome: &'static str) {
    metrics::counter!("stream_exchanges_total", "outcome" => outcome).increment(1);
}

pub fn record_pending(count: usize) {
    metrics::gauge!("stream_pending_exchanges").set(count as f64);
}

pub fn record_peers(count: usize) {
    metrics::gauge!("stream_connected_peers").set(count as f64);
}

pub fn record_bytes_served(bytes: usize) {
    metrics::counter!("stream_bytes_served_total").increment(bytes as u64);
}
