//! HTTP/WebSocket API for the lobby host.
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `GET /health` - Server health status
//! - `GET /api/v1/lobby` - Current roster
//! - `GET /api/v1/lobby/slots/{index}` - One seat plus the host's permissions on it
//!
//! ## Host only (`Authorization: Bearer <HOST_TOKEN>`)
//! - `PUT /api/v1/lobby/slots/{index}` - Edit a seat
//! - `DELETE /api/v1/lobby/slots/{index}` - Vacate a seat, kicking its player
//! - `POST /api/v1/lobby/start` - Start the match
//!
//! ## WebSocket
//! - `GET /ws` - Remote player connection; the first frame must be a hello
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use card_lobby::{LobbyConfig, LobbySession, RosterBroadcaster, StaticAvatars};
//! use cl_server::api::{AppState, create_router};
//! use std::{sync::Arc, time::Duration};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broadcaster = RosterBroadcaster::default();
//! let session = LobbySession::host(
//!     &LobbyConfig::default(),
//!     &StaticAvatars::default(),
//!     Arc::new(broadcaster.clone()),
//! )?;
//!
//! let state = AppState::new(
//!     Arc::new(session),
//!     broadcaster,
//!     "0123456789abcdef",
//!     Duration::from_secs(10),
//! );
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod lobby;
pub mod middleware;
pub mod rate_limiter;
pub mod request_id;
pub mod seats;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use card_lobby::{LobbyPhase, LobbySession, RosterBroadcaster};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;

use seats::SeatRegistry;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// The hosted lobby
    pub session: Arc<LobbySession>,
    /// Roster updates for connected sockets; must be the session's observer
    pub broadcaster: RosterBroadcaster,
    /// Seat leases held by sockets
    pub seats: SeatRegistry,
    /// Bearer token for the host-only endpoints
    pub host_token: Arc<str>,
    /// Deadline for a new socket's hello
    pub hello_timeout: Duration,
}

impl AppState {
    pub fn new(
        session: Arc<LobbySession>,
        broadcaster: RosterBroadcaster,
        host_token: impl Into<Arc<str>>,
        hello_timeout: Duration,
    ) -> Self {
        Self {
            session,
            broadcaster,
            seats: SeatRegistry::new(),
            host_token: host_token.into(),
            hello_timeout,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```text
/// GET    /health                         - Health check (public)
/// GET    /api/v1/lobby                   - Roster (public)
/// GET    /api/v1/lobby/slots/{index}     - Seat + permissions (public)
/// PUT    /api/v1/lobby/slots/{index}     - Edit seat (host)
/// DELETE /api/v1/lobby/slots/{index}     - Vacate seat (host)
/// POST   /api/v1/lobby/start             - Start match (host)
/// GET    /ws                             - WebSocket (hello required)
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/lobby", get(lobby::get_lobby))
        .route("/lobby/slots/{index}", get(lobby::get_slot));

    let host_routes = Router::new()
        .route(
            "/lobby/slots/{index}",
            axum::routing::put(lobby::update_slot).delete(lobby::vacate_slot),
        )
        .route("/lobby/start", post(lobby::start_match))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::host_auth_middleware,
        ));

    Router::new().merge(public_routes).merge(host_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` while the lobby is open or playing, `503 Service
/// Unavailable` once it has been closed.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","lobby":{...},"connections":1,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.session.snapshot().await;
    let healthy = snapshot.phase != LobbyPhase::Closed;

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "lobby": {
            "name": state.session.name(),
            "phase": snapshot.phase,
            "slots": snapshot.slots.len(),
            "occupied": snapshot.occupied_count(),
            "remote": snapshot.remote_count(),
        },
        "connections": state.seats.connected().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
