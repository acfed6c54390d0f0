//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, origin fetches, version refreshes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `spa_proxy_requests_total` (counter): requests by method, status, cache
//! - `spa_proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `spa_proxy_origin_fetches_total` (counter): origin fetches by outcome
//! - `spa_proxy_origin_fetch_duration_seconds` (histogram): origin latency
//! - `spa_proxy_version_refresh_total` (counter): default version polls by outcome
//! - `spa_proxy_dev_proxy_requests_total` (counter): dev-path forwards by outcome
//!
//! # Design Decisions
//! - Recording is always on; without an installed recorder it is a no-op
//! - The exporter runs its own listener, separate from proxy traffic

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and start its HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {}", e))?;

    describe_counter!("spa_proxy_requests_total", "Requests served by the proxy");
    describe_histogram!(
        "spa_proxy_request_duration_seconds",
        "End-to-end request duration in seconds"
    );
    describe_counter!("spa_proxy_origin_fetches_total", "Cache fills fetched from the origin");
    describe_histogram!(
        "spa_proxy_origin_fetch_duration_seconds",
        "Origin fetch duration in seconds"
    );
    describe_counter!("spa_proxy_version_refresh_total", "Default version polls");
    describe_counter!(
        "spa_proxy_dev_proxy_requests_total",
        "Requests forwarded to dev-path targets"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished request. `cache` is `hit`, `miss` or `none`.
pub fn record_request(method: &str, status: u16, cache: &'static str, start: Instant) {
    counter!(
        "spa_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "cache" => cache
    )
    .increment(1);
    histogram!("spa_proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_origin_fetch(outcome: &'static str, start: Instant) {
    counter!("spa_proxy_origin_fetches_total", "outcome" => outcome).increment(1);
    histogram!("spa_proxy_origin_fetch_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_version_refresh(outcome: &'static str) {
    counter!("spa_proxy_version_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_dev_proxy(outcome: &'static str) {
    counter!("spa_proxy_dev_proxy_requests_total", "outcome" => outcome).increment(1);
}
