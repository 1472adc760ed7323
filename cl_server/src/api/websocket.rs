//! WebSocket transport for remote players.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Client sends `hello` within the configured timeout
//! 3. Server claims the first open seat and answers `welcome`, or answers
//!    `lobby_full` and closes
//! 4. Server spawns a send task that pushes every roster change
//! 5. Client may edit its own seat with `update_seat` and leaves with
//!    `leave` or by closing the socket
//! 6. On disconnect the seat is released, unless the host already vacated it
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws');
//! ws.onopen = () => ws.send(JSON.stringify({type: "hello", name: "Bob", avatar_index: 3}));
//! ws.onmessage = (event) => render(JSON.parse(event.data));
//! ```

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use card_lobby::{
    LobbySession, ProtocolVersion, RosterSnapshot,
    messages::{ClientMessage, MAX_MESSAGE_SIZE, ServerMessage},
    net::errors::ProtocolError,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, error, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc, oneshot,
};
use uuid::Uuid;

use super::{AppState, rate_limiter::MessageLimiter, seats::ConnectionId};
use crate::metrics;

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

/// How long the send task gets to flush its close frame
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Upgrade HTTP connection to WebSocket.
///
/// Frames larger than the protocol maximum are refused by the upgrade itself.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// A seated player
struct Seat {
    index: usize,
    connection: ConnectionId,
    name: String,
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(true);

    let (mut sender, mut receiver) = socket.split();
    let connection = Uuid::new_v4();
    debug!("WebSocket opened: connection={}", connection);

    let (name, avatar_index) = match await_hello(&mut receiver, &state).await {
        Ok(hello) => hello,
        Err(reason) => {
            info!("Dropping connection {}: {}", connection, reason);
            send_and_close(&mut sender, Some(ServerMessage::error(reason))).await;
            metrics::websocket_connections_active(false);
            return;
        }
    };

    // Subscribe before claiming so no roster change can slip past
    let updates = state.broadcaster.subscribe();

    let claimed = {
        let mut seats = state.seats.lock().await;
        match state.session.connect_player(&name, avatar_index).await {
            Ok(Some(index)) => Ok(Some((index, seats.lease(index, connection)))),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        }
    };

    let (index, kicked) = match claimed {
        Ok(Some(seat)) => seat,
        Ok(None) => {
            metrics::lobby_full_total();
            send_and_close(&mut sender, Some(ServerMessage::LobbyFull)).await;
            metrics::websocket_connections_active(false);
            return;
        }
        Err(e) => {
            warn!("Seat claim for {} failed: {}", name, e);
            send_and_close(&mut sender, Some(ServerMessage::error(e.to_string()))).await;
            metrics::websocket_connections_active(false);
            return;
        }
    };
    metrics::seat_claims_total();
    let seat = Seat {
        index,
        connection,
        name: name.trim().to_string(),
    };
    info!(
        "WebSocket seated: seat={}, player={}, connection={}",
        seat.index, seat.name, seat.connection
    );

    let roster = state.session.snapshot().await;
    let last_version = roster.version;
    let welcome = ServerMessage::Welcome {
        lobby: state.session.name().to_string(),
        slot_index: seat.index,
        roster,
    };
    if send_message(&mut sender, &welcome).await.is_err() {
        release_seat(&state, &seat).await;
        metrics::websocket_connections_active(false);
        return;
    }

    // Channel for responses from the receive loop
    let (response_tx, response_rx) = mpsc::channel::<ServerMessage>(32);

    let mut send_task = tokio::spawn(forward_updates(
        sender,
        state.session.clone(),
        updates,
        response_rx,
        kicked,
        last_version,
    ));

    let mut limiter = MessageLimiter::default();
    let mut send_done = false;

    loop {
        tokio::select! {
            // Send task ended: kicked, or the socket is gone
            _ = &mut send_task => {
                send_done = true;
                break;
            }
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket closed by {}", seat.name);
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!("WebSocket error for {}: {}", seat.name, e);
                        break;
                    }
                };

                if let Err(exceeded) = limiter.check() {
                    warn!("{} rate limit exceeded for {}", exceeded.label(), seat.name);
                    metrics::rate_limit_hits_total(exceeded.label());
                    if response_tx.send(ServerMessage::error(exceeded.message())).await.is_err() {
                        break;
                    }
                    continue;
                }

                let response = match ClientMessage::from_json(text.as_str()) {
                    Ok(ClientMessage::Leave) => {
                        info!("{} left seat {}", seat.name, seat.index);
                        break;
                    }
                    Ok(message) => handle_client_message(message, &seat, &state).await,
                    Err(e) => {
                        warn!("Failed to parse message from {}: {}", seat.name, e);
                        Some(ServerMessage::error("Invalid message format"))
                    }
                };

                if let Some(response) = response
                    && response_tx.send(response).await.is_err()
                {
                    break;
                }
            }
        }
    }

    // Closing the response channel makes the send task close the socket
    drop(response_tx);
    if !send_done && tokio::time::timeout(CLOSE_GRACE, &mut send_task).await.is_err() {
        send_task.abort();
    }
    release_seat(&state, &seat).await;
    metrics::websocket_connections_active(false);
    info!(
        "WebSocket disconnected: seat={}, player={}",
        seat.index, seat.name
    );
}

/// Wait for the hello frame and check its version.
async fn await_hello(receiver: &mut WsReceiver, state: &AppState) -> Result<(String, u32), String> {
    let first = tokio::time::timeout(state.hello_timeout, async {
        loop {
            match receiver.next().await {
                Some(Ok(Message::Text(text))) => return Some(text),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .map_err(|_| "No hello before timeout".to_string())?
    .ok_or_else(|| "Closed before hello".to_string())?;

    parse_hello(first.as_str()).map_err(|e| e.to_string())
}

/// Name and avatar from a hello frame at a version we speak.
fn parse_hello(text: &str) -> Result<(String, u32), ProtocolError> {
    match ClientMessage::from_json(text)? {
        ClientMessage::Hello {
            version,
            name,
            avatar_index,
        } => {
            ProtocolVersion::negotiate(version)?;
            Ok((name, avatar_index))
        }
        other => Err(ProtocolError::UnexpectedMessage(format!(
            "expected hello, got {}",
            other
        ))),
    }
}

/// Process a message from a seated player.
///
/// Returns the message to send back, if any. Successful edits are answered
/// by the roster push instead.
async fn handle_client_message(
    msg: ClientMessage,
    seat: &Seat,
    state: &AppState,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Hello { .. } => Some(ServerMessage::error("Already seated")),
        ClientMessage::UpdateSeat { .. } => {
            let update = msg.seat_update()?;
            if update.is_empty() {
                return Some(ServerMessage::error("Empty seat update"));
            }

            let seats = state.seats.lock().await;
            if !seats.holds(seat.index, seat.connection) {
                return Some(ServerMessage::error("You no longer hold a seat"));
            }
            match state.session.apply_update(seat.index, update).await {
                Ok(_) => None,
                Err(e) => Some(ServerMessage::error(e.to_string())),
            }
        }
        ClientMessage::Leave => None,
    }
}

/// Free the seat unless the host already took it back.
async fn release_seat(state: &AppState, seat: &Seat) {
    let mut seats = state.seats.lock().await;
    if !seats.release(seat.index, seat.connection) {
        return;
    }

    match state.session.disconnect_player(seat.index).await {
        Ok(()) => metrics::seat_releases_total("left"),
        // After the match starts the roster is frozen
        Err(e) => debug!("Seat {} kept after disconnect: {}", seat.index, e),
    }
}

/// Push roster changes and responses until kicked or the socket fails.
async fn forward_updates(
    mut sender: WsSender,
    session: Arc<LobbySession>,
    mut updates: broadcast::Receiver<RosterSnapshot>,
    mut responses: mpsc::Receiver<ServerMessage>,
    mut kicked: oneshot::Receiver<()>,
    mut last_version: u64,
) {
    loop {
        let message = tokio::select! {
            _ = &mut kicked => {
                send_and_close(&mut sender, Some(ServerMessage::Removed)).await;
                return;
            }
            update = updates.recv() => {
                let roster = match update {
                    Ok(roster) => roster,
                    Err(RecvError::Lagged(missed)) => {
                        debug!("Roster subscriber lagged by {}, resyncing", missed);
                        session.snapshot().await
                    }
                    Err(RecvError::Closed) => return,
                };
                // Versions already sent (the welcome included) are skipped
                if roster.version <= last_version {
                    continue;
                }
                last_version = roster.version;
                ServerMessage::Roster { roster }
            }
            response = responses.recv() => match response {
                Some(response) => response,
                None => {
                    send_and_close(&mut sender, None).await;
                    return;
                }
            },
        };

        if send_message(&mut sender, &message).await.is_err() {
            return;
        }
    }
}

async fn send_message(sender: &mut WsSender, message: &ServerMessage) -> Result<(), ()> {
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize {}: {}", message, e);
            return Ok(());
        }
    };
    sender
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| debug!("WebSocket send failed: {}", e))
}

/// Send a final message, if any, then a normal close frame.
async fn send_and_close(sender: &mut WsSender, last: Option<ServerMessage>) {
    if let Some(message) = last
        && send_message(sender, &message).await.is_err()
    {
        return;
    }
    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "".into(),
        })))
        .await;
}
