//! Lobby REST handlers.
//!
//! Reads are public. Writes require the host token and are additionally
//! gated by the session's authority policy; a denied write returns
//! `403 Forbidden` and leaves the roster untouched.
//!
//! # Examples
//!
//! Rename the host's seat:
//! ```bash
//! curl -X PUT http://localhost:6969/api/v1/lobby/slots/0 \
//!   -H "Authorization: Bearer $HOST_TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Alice"}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use card_lobby::{LobbyError, RosterSnapshot, Slot, SlotType, SlotUpdate};
use serde::{Deserialize, Serialize};

use super::{AppState, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct LobbyResponse {
    pub name: String,
    pub has_authority: bool,
    pub roster: RosterSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlotResponse {
    pub slot: Slot,
    pub may_edit: bool,
    pub may_control: bool,
    pub may_remove: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn lobby_error(err: LobbyError) -> ApiError {
    let status = match err {
        LobbyError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
        LobbyError::NotAuthoritative => StatusCode::FORBIDDEN,
        _ if err.is_bad_request() => StatusCode::BAD_REQUEST,
        LobbyError::SeatOpen(_) | LobbyError::NotReady(_) | LobbyError::SessionEnded(_) => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.to_string())
}

/// Current roster.
///
/// # Response
///
/// ```json
/// {
///   "name": "Lobby",
///   "has_authority": true,
///   "roster": { "version": 3, "phase": "waiting", "slots": [ ... ] }
/// }
/// ```
pub async fn get_lobby(State(state): State<AppState>) -> Json<LobbyResponse> {
    Json(LobbyResponse {
        name: state.session.name().to_string(),
        has_authority: state.session.has_authority(),
        roster: state.session.snapshot().await,
    })
}

/// One seat plus what the host may do with it.
///
/// # Errors
///
/// - `404 Not Found`: Index out of range
pub async fn get_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SlotResponse>, ApiError> {
    let slot = state.session.slot_at(index).await.map_err(lobby_error)?;
    let policy = state.session.policy();

    Ok(Json(SlotResponse {
        may_edit: policy.may_edit(slot.slot_type()),
        may_control: policy.may_control(slot.slot_type()),
        may_remove: policy.may_remove(slot.slot_type()),
        slot,
    }))
}

/// Edit a seat.
///
/// Name, avatar, type and AI options need `may_edit`; the ready flag needs
/// `may_control`.
///
/// # Errors
///
/// - `400 Bad Request`: Empty edit or an edit that would break the seat
/// - `403 Forbidden`: The policy denies the edit
/// - `404 Not Found`: Index out of range
/// - `409 Conflict`: The match already started
pub async fn update_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    request_id: RequestId,
    Json(update): Json<SlotUpdate>,
) -> Result<Json<Slot>, ApiError> {
    if update.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Empty seat update"));
    }

    // Held so a player cannot take the seat between the check and the edit
    let _seats = state.seats.lock().await;

    let slot = state.session.slot_at(index).await.map_err(lobby_error)?;
    let policy = state.session.policy();
    if update.edits_content() && !policy.may_edit(slot.slot_type()) {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            format!("Host may not edit {} seat {}", slot.slot_type(), index),
        ));
    }
    if update.ready.is_some() && !policy.may_control(slot.slot_type()) {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            format!("Host may not control {} seat {}", slot.slot_type(), index),
        ));
    }

    let slot = state
        .session
        .apply_update(index, update)
        .await
        .map_err(lobby_error)?;

    logging::log_host_action(request_id.as_str(), "update", Some(index));
    Ok(Json(slot))
}

/// Vacate a seat. A remote player sitting there is sent `removed` and
/// disconnected.
///
/// # Errors
///
/// - `403 Forbidden`: The policy denies removal
/// - `404 Not Found`: Index out of range
/// - `409 Conflict`: The match already started
pub async fn vacate_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    request_id: RequestId,
) -> Result<Json<Slot>, ApiError> {
    let mut seats = state.seats.lock().await;

    let slot = state.session.slot_at(index).await.map_err(lobby_error)?;
    if !state.session.policy().may_remove(slot.slot_type()) {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            format!("Host may not remove seat {}", index),
        ));
    }

    state
        .session
        .disconnect_player(index)
        .await
        .map_err(lobby_error)?;

    if let Some(connection) = seats.kick(index) {
        tracing::info!(connection = %connection, slot_index = index, "Kicked remote player");
    }
    if slot.slot_type() == SlotType::Remote {
        metrics::seat_releases_total("kicked");
    }
    drop(seats);

    logging::log_host_action(request_id.as_str(), "vacate", Some(index));
    let slot = state.session.slot_at(index).await.map_err(lobby_error)?;
    Ok(Json(slot))
}

/// Start the match.
///
/// # Errors
///
/// - `409 Conflict`: A seat is open, a remote player is not ready, or the
///   match already started
pub async fn start_match(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Result<Json<RosterSnapshot>, ApiError> {
    let roster = state.session.start_match().await.map_err(lobby_error)?;
    logging::log_host_action(request_id.as_str(), "start", None);
    Ok(Json(roster))
}
