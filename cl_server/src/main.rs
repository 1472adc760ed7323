//! Card lobby host.
//!
//! Hosts one lobby, seats remote players over WebSocket and exposes the
//! host's controls as a small REST API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use card_lobby::{LobbySession, ObserverSet, RosterBroadcaster, StaticAvatars};
use cl_server::{
    api,
    config::{CliOverrides, ServerConfig},
    logging,
    metrics::{self, MetricsObserver},
};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Host a card game lobby

USAGE:
  cl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --slots      N           Number of seats             [default: env LOBBY_SLOTS or 2]
  --ai-seats   N           Seats taken by AI players   [default: env LOBBY_AI_SEATS or 0]
  --host-name  NAME        Name of the host's player   [default: env LOBBY_HOST_NAME or Host]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  HOST_TOKEN               Bearer token for host-only endpoints (required, 16+ chars)
  LOBBY_NAME               Lobby name shown to players
  LOBBY_HOST_AVATAR        Avatar of the host's seat
  LOBBY_AI_SIMULATION      Let AI players simulate before choosing (true/false)
  HELLO_TIMEOUT_SECS       Seconds a new socket has to say hello
  METRICS_BIND             Prometheus listener address (disabled when unset)
  (A .env file in the working directory is loaded first)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        slot_count: pargs.opt_value_from_str("--slots")?,
        ai_seats: pargs.opt_value_from_str("--ai-seats")?,
        host_name: pargs.opt_value_from_str("--host-name")?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics on http://{}/metrics", addr);
    }

    let broadcaster = RosterBroadcaster::default();
    let observer = ObserverSet::new()
        .with(Arc::new(broadcaster.clone()))
        .with(Arc::new(MetricsObserver));

    let session = Arc::new(LobbySession::host(
        &config.lobby,
        &StaticAvatars(vec![config.host_avatar]),
        Arc::new(observer),
    )?);

    let roster = session.snapshot().await;
    metrics::lobby_seats(roster.occupied_count(), roster.remote_count());
    for slot in &roster.slots {
        info!("  - {}", slot);
    }

    let state = api::AppState::new(
        session.clone(),
        broadcaster,
        config.host_token.as_str(),
        config.hello_timeout,
    );
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Lobby '{}' is open at ws://{}/ws. Press Ctrl+C to stop.",
        session.name(),
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    session.close().await;
    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
    }
}
