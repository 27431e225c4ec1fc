//! Metrics collection and export for the Pulse demo.
//!
//! Uses the `metrics` crate for instrumentation and optionally exports
//! to Prometheus format.

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use pulse_core::Priority;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const SENT_TOTAL: &str = "pulse_sent_total";
    pub const REJECTED_TOTAL: &str = "pulse_rejected_total";
    pub const DELIVERED_TOTAL: &str = "pulse_delivered_total";
    pub const STREAMS_RELEASED_TOTAL: &str = "pulse_streams_released_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(names::SENT_TOTAL, "Pulses accepted by a channel or stream");
    metrics::describe_counter!(
        names::REJECTED_TOTAL,
        "Pulses refused because the target was released"
    );
    metrics::describe_counter!(names::DELIVERED_TOTAL, "Pulses handled by a handler");
    metrics::describe_counter!(
        names::STREAMS_RELEASED_TOTAL,
        "Release notifications received"
    );

    info!("Metrics initialized");
}

/// Start the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns an error if the exporter cannot be installed.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record an accepted send.
pub fn record_sent(priority: Priority) {
    counter!(names::SENT_TOTAL, "priority" => priority.to_string()).increment(1);
}

/// Record a send refused with `Released`.
pub fn record_rejected() {
    counter!(names::REJECTED_TOTAL).increment(1);
}

/// Record a handler invocation.
pub fn record_delivered(kind: &'static str) {
    counter!(names::DELIVERED_TOTAL, "kind" => kind).increment(1);
}

/// Record a release notification for one side of a stream.
pub fn record_stream_released(side: &'static str) {
    counter!(names::STREAMS_RELEASED_TOTAL, "side" => side).increment(1);
}
