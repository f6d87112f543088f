//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cascade_requests_total` (counter): requests by verb, status
//! - `cascade_request_duration_seconds` (histogram): latency distribution
//! - `cascade_stage_executions_total` (counter): stage runs by kind, outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own scrape address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(verb: &str, status: u16, start: Instant) {
    metrics::counter!(
        "cascade_requests_total",
        "verb" => verb.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("cascade_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one stage execution.
pub fn record_stage(kind: &'static str, outcome: &'static str) {
    metrics::counter!(
        "cascade_stage_executions_total",
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}
