//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sync_rebuilds_total` (counter): rebuild attempts by result
//! - `sync_config_version` (gauge): current published version
//! - `sync_pushes_total` (counter): per-server push attempts by outcome
//! - `sync_orchestrator_events_total` (counter): events received by relevance
//! - `sync_event_stream_reconnects_total` (counter): event stream terminations

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rebuild(result: &'static str) {
    counter!("sync_rebuilds_total", "result" => result).increment(1);
}

pub fn record_config_version(version: u64) {
    gauge!("sync_config_version").set(version as f64);
}

pub fn record_push(outcome: &'static str) {
    counter!("sync_pushes_total", "outcome" => outcome).increment(1);
}

pub fn record_event(relevant: bool) {
    let relevant = if relevant { "true" } else { "false" };
    counter!("sync_orchestrator_events_total", "relevant" => relevant).increment(1);
}

pub fn record_reconnect() {
    counter!("sync_event_stream_reconnects_total").increment(1);
}
