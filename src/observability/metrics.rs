//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mediator_http_requests_total` (counter): HTTP requests by transport, status
//! - `mediator_request_duration_seconds` (histogram): HTTP handler latency
//! - `mediator_stream_connections_total` (counter): raw connections by transport, outcome
//! - `mediator_bytes_received_total` (counter): body bytes read, by transport
//! - `mediator_active_connections` (gauge): in-flight raw connections
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::net::transport::Transport;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_http_request(transport: Transport, status: u16, start: Instant) {
    counter!(
        "mediator_http_requests_total",
        "transport" => transport.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("mediator_request_duration_seconds", "transport" => transport.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_bytes_received(transport: Transport, bytes: usize) {
    counter!("mediator_bytes_received_total", "transport" => transport.as_str())
        .increment(bytes as u64);
}

/// Count a finished raw stream connection. `outcome` is a short static label
/// such as `acknowledged` or `read_error`.
pub fn record_stream_outcome(transport: Transport, outcome: &'static str) {
    counter!(
        "mediator_stream_connections_total",
        "transport" => transport.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn connection_opened(transport: Transport) {
    gauge!("mediator_active_connections", "transport" => transport.as_str()).increment(1.0);
}

pub fn connection_closed(transport: Transport) {
    gauge!("mediator_active_connections", "transport" => transport.as_str()).decrement(1.0);
}
