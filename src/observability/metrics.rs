//! Metrics collection and exposition.
//!
//! # Metrics
//! - `qr_requests_total` (counter): render requests by variant and outcome
//! - `qr_gate_denials_total` (counter): denials by gate stage and error code
//! - `qr_render_duration_seconds` (histogram): render latency by variant
//! - `qr_rate_limit_tracked_identities` (gauge): identities held by the limiter
//!
//! Updates go through the `metrics` facade and are no-ops until a recorder
//! is installed by [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// `variant` must come from a fixed set so the series count stays bounded.
pub fn record_request(variant: &'static str, outcome: &'static str) {
    counter!("qr_requests_total", "variant" => variant, "outcome" => outcome).increment(1);
}

pub fn record_denial(stage: &'static str, code: &'static str) {
    counter!("qr_gate_denials_total", "stage" => stage, "code" => code).increment(1);
}

pub fn record_render(variant: &'static str, start: Instant) {
    histogram!("qr_render_duration_seconds", "variant" => variant)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_tracked_identities(count: usize) {
    gauge!("qr_rate_limit_tracked_identities").set(count as f64);
}
