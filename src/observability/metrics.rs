//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define transfer metrics (opened, closed, live, bytes, duration)
//! - Optionally install a Prometheus recorder and render a snapshot
//!
//! # Metrics
//! - `transfer_stats_opened_total` (counter): transfers opened
//! - `transfer_stats_closed_total` (counter): transfers closed and logged
//! - `transfer_stats_live` (gauge): transfers currently in the table
//! - `transfer_stats_response_bytes_total` (counter): counted response bytes
//! - `transfer_stats_response_duration_seconds` (histogram): header-to-end time
//!
//! # Design Decisions
//! - Only recorded while the transfer log is enabled
//! - Without an installed recorder every call is a no-op
//! - The live gauge moves by one per open and close, so every client in the
//!   process contributes to the same total

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install a process-wide Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

/// Record a newly opened transfer.
pub fn record_transfer_opened() {
    counter!("transfer_stats_opened_total").increment(1);
    gauge!("transfer_stats_live").increment(1.0);
}

/// Record a closed transfer.
pub fn record_transfer_closed(status: u16, body_bytes: u64, elapsed: Duration) {
    let status = status.to_string();
    counter!("transfer_stats_closed_total", "status" => status).increment(1);
    counter!("transfer_stats_response_bytes_total").increment(body_bytes);
    histogram!("transfer_stats_response_duration_seconds").record(elapsed.as_secs_f64());
    gauge!("transfer_stats_live").decrement(1.0);
}
