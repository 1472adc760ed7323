//! Prometheus metrics for monitoring the lobby host.
//!
//! Metrics are exposed in Prometheus text format on a separate listener when
//! `METRICS_BIND` is set. Without an installed recorder every call below is a
//! no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cl_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::seat_claims_total();
//! ```

use card_lobby::{RosterObserver, RosterSnapshot};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Track a socket opening (`true`) or closing (`false`).
pub fn websocket_connections_active(opened: bool) {
    let gauge = metrics::gauge!("websocket_connections_active");
    if opened {
        gauge.increment(1.0);
    } else {
        gauge.decrement(1.0);
    }
}

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(window: &str) {
    metrics::counter!("rate_limit_hits_total",
        "window" => window.to_string()
    )
    .increment(1);
}

// ============================================================================
// Lobby Metrics
// ============================================================================

/// Increment seats claimed by remote players.
pub fn seat_claims_total() {
    metrics::counter!("lobby_seat_claims_total").increment(1);
}

/// Increment connects turned away because no seat was open.
pub fn lobby_full_total() {
    metrics::counter!("lobby_full_rejections_total").increment(1);
}

/// Increment seats released, labelled by who released them.
pub fn seat_releases_total(reason: &str) {
    metrics::counter!("lobby_seat_releases_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Set current occupied and remote seat counts.
pub fn lobby_seats(occupied: usize, remote: usize) {
    metrics::gauge!("lobby_seats_occupied").set(occupied as f64);
    metrics::gauge!("lobby_seats_remote").set(remote as f64);
}

/// Keeps the seat gauges in step with the roster
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl RosterObserver for MetricsObserver {
    fn on_roster_changed(&self, snapshot: &RosterSnapshot) {
        lobby_seats(snapshot.occupied_count(), snapshot.remote_count());
    }
}
