//! Structured logging configuration.
//!
//! The lobby core logs through the `log` facade; the subscriber installed here
//! picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var.
///
/// # Example
///
/// ```no_run
/// use cl_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a request that was refused by the host token check
///
/// # Example
///
/// ```
/// use cl_server::logging::log_rejected_host_request;
///
/// log_rejected_host_request("DELETE", "/api/v1/lobby/slots/1", "missing bearer token");
/// ```
pub fn log_rejected_host_request(method: &str, path: &str, reason: &str) {
    tracing::warn!(
        http_method = method,
        http_path = path,
        "SECURITY: host request rejected: {}",
        reason
    );
}

/// Log a host action that changed the lobby
pub fn log_host_action(request_id: &str, action: &str, slot_index: Option<usize>) {
    tracing::info!(
        request_id = request_id,
        action = action,
        slot_index = slot_index,
        "Host action applied"
    );
}
