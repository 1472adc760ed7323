//! Integration tests for the lobby REST API.
//!
//! Tests health reporting, host token checks and policy enforcement.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use card_lobby::{
    LobbyConfig, LobbySession, RosterBroadcaster, SlotType, SlotUpdate, StaticAvatars,
};
use cl_server::api::{AppState, create_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // For `oneshot` method

const HOST_TOKEN: &str = "test_host_token_0123";

/// Helper to create a test server around a fresh lobby
fn create_test_server(slot_count: usize, ai_seats: usize) -> (axum::Router, Arc<LobbySession>) {
    let broadcaster = RosterBroadcaster::default();
    let config = LobbyConfig {
        host_name: "Alice".to_string(),
        slot_count,
        ai_seats,
        ..LobbyConfig::default()
    };
    let session = Arc::new(
        LobbySession::host(&config, &StaticAvatars(vec![0]), Arc::new(broadcaster.clone()))
            .expect("valid lobby config"),
    );

    let state = AppState::new(
        session.clone(),
        broadcaster,
        HOST_TOKEN,
        Duration::from_secs(5),
    );
    (create_router(state), session)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn host_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", HOST_TOKEN));
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server(3, 0);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["lobby"]["slots"], 3);
    assert_eq!(json["lobby"]["occupied"], 1);
    assert_eq!(json["lobby"]["phase"], "waiting");
}

#[tokio::test]
async fn test_health_check_after_close() {
    let (app, session) = create_test_server(2, 0);
    session.close().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_header() {
    let (app, _) = create_test_server(2, 0);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

// ============================================================================
// Read Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_get_lobby() {
    let (app, session) = create_test_server(3, 1);
    session.connect_player("Bob", 3).await.unwrap();

    let response = app.oneshot(get("/api/v1/lobby")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["has_authority"], true);
    assert_eq!(json["roster"]["version"], 1);
    let slots = json["roster"]["slots"].as_array().unwrap();
    assert_eq!(slots[0]["slot_type"], "local");
    assert_eq!(slots[1]["slot_type"], "ai");
    assert_eq!(slots[2]["slot_type"], "remote");
    assert_eq!(slots[2]["name"], "Bob");
}

#[tokio::test]
async fn test_get_slot_permissions() {
    let (app, session) = create_test_server(3, 0);
    session.connect_player("Bob", 3).await.unwrap();

    let json = json_body(app.clone().oneshot(get("/api/v1/lobby/slots/0")).await.unwrap()).await;
    assert_eq!(json["may_edit"], true);
    assert_eq!(json["may_control"], true);
    assert_eq!(json["may_remove"], true);

    let json = json_body(app.clone().oneshot(get("/api/v1/lobby/slots/1")).await.unwrap()).await;
    assert_eq!(json["slot"]["slot_type"], "remote");
    assert_eq!(json["may_edit"], false);
    assert_eq!(json["may_control"], false);
    assert_eq!(json["may_remove"], true);

    let json = json_body(app.oneshot(get("/api/v1/lobby/slots/2")).await.unwrap()).await;
    assert_eq!(json["may_edit"], false);
    assert_eq!(json["may_control"], true);
}

#[tokio::test]
async fn test_get_slot_out_of_range() {
    let (app, _) = create_test_server(2, 0);

    let response = app.oneshot(get("/api/v1/lobby/slots/7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("out of range"));
}

// ============================================================================
// Host Token Tests
// ============================================================================

#[tokio::test]
async fn test_host_routes_require_token() {
    let (app, session) = create_test_server(2, 0);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/lobby/start")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/lobby/slots/0")
        .header("authorization", "Bearer not_the_host_token")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Nothing changed
    assert_eq!(session.snapshot().await.version, 0);
}

// ============================================================================
// Edit Tests
// ============================================================================

#[tokio::test]
async fn test_host_edits_own_seat() {
    let (app, session) = create_test_server(2, 0);

    let request = host_request(
        "PUT",
        "/api/v1/lobby/slots/0",
        Some(json!({"name": "Alicia", "avatar_index": 4})),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let slot = session.slot_at(0).await.unwrap();
    assert_eq!(slot.name(), "Alicia");
    assert_eq!(slot.avatar_index(), Some(4));
}

#[tokio::test]
async fn test_host_turns_local_seat_into_ai() {
    let (app, session) = create_test_server(2, 0);

    let request = host_request(
        "PUT",
        "/api/v1/lobby/slots/0",
        Some(json!({"slot_type": "ai", "ai_options": ["use_simulation"]})),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(session.slot_at(0).await.unwrap().slot_type(), SlotType::Ai);
}

#[tokio::test]
async fn test_edit_remote_seat_forbidden() {
    let (app, session) = create_test_server(2, 0);
    session.connect_player("Bob", 3).await.unwrap();
    let before = session.snapshot().await;

    let request = host_request("PUT", "/api/v1/lobby/slots/1", Some(json!({"name": "Mallory"})));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Host does not control a remote player's ready flag either
    let request = host_request("PUT", "/api/v1/lobby/slots/1", Some(json!({"ready": true})));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(session.snapshot().await, before);
}

#[tokio::test]
async fn test_edit_open_seat_forbidden() {
    let (app, _) = create_test_server(2, 0);

    let request = host_request("PUT", "/api/v1/lobby/slots/1", Some(json!({"name": "Ghost"})));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_edits_rejected() {
    let (app, _) = create_test_server(2, 0);

    let request = host_request("PUT", "/api/v1/lobby/slots/0", Some(json!({})));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = host_request("PUT", "/api/v1/lobby/slots/0", Some(json!({"name": "  "})));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = host_request(
        "PUT",
        "/api/v1/lobby/slots/0",
        Some(json!({"slot_type": "remote"})),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Vacate Tests
// ============================================================================

#[tokio::test]
async fn test_vacate_remote_seat() {
    let (app, session) = create_test_server(2, 0);
    session.connect_player("Bob", 3).await.unwrap();

    let response = app
        .oneshot(host_request("DELETE", "/api/v1/lobby/slots/1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["slot_type"], "open");
    assert_eq!(json["name"], "");
    assert_eq!(session.connect_player("Cara", 7).await, Ok(Some(1)));
}

#[tokio::test]
async fn test_vacate_out_of_range() {
    let (app, _) = create_test_server(2, 0);
    let response = app
        .oneshot(host_request("DELETE", "/api/v1/lobby/slots/5", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Start Tests
// ============================================================================

#[tokio::test]
async fn test_start_requires_full_ready_lobby() {
    let (app, session) = create_test_server(2, 0);

    let response = app
        .clone()
        .oneshot(host_request("POST", "/api/v1/lobby/start", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    session.connect_player("Bob", 3).await.unwrap();
    let response = app
        .clone()
        .oneshot(host_request("POST", "/api/v1/lobby/start", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Bob readies himself (the self-service path)
    session
        .apply_update(
            1,
            SlotUpdate {
                ready: Some(true),
                ..SlotUpdate::default()
            },
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(host_request("POST", "/api/v1/lobby/start", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["phase"], "started");

    // Roster is frozen now
    let response = app
        .oneshot(host_request("DELETE", "/api/v1/lobby/slots/1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ============================================================================
// WebSocket Upgrade Tests
// ============================================================================

#[tokio::test]
async fn test_websocket_requires_upgrade() {
    let (app, _) = create_test_server(2, 0);

    let response = app.oneshot(get("/ws")).await.unwrap();
    assert!(
        response.status().is_client_error(),
        "plain GET on /ws should be rejected, got: {}",
        response.status()
    );
}
