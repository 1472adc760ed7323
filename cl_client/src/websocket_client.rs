//! WebSocket client for a lobby seat.
//!
//! The client keeps a mirror of the host's roster: a non-authoritative
//! [`LobbySession`] that is only ever brought up to date from the snapshots
//! the host pushes.

use anyhow::{Context, Result, bail};
use card_lobby::{
    LobbySession, NoopObserver, RosterSnapshot, SlotType,
    messages::{ClientMessage, ServerMessage},
};
use futures_util::{SinkExt, StreamExt};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::commands::{HELP, LobbyCommand, parse_command};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something that happened on the connection after joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A roster arrived; `true` if it was newer than the mirror and applied.
    RosterUpdated(bool),
    /// The host vacated our seat.
    Removed,
    /// The host rejected our last message.
    Error(String),
    /// The connection is gone.
    Closed,
}

/// A seated lobby connection
pub struct LobbyClient {
    stream: WsStream,
    mirror: Arc<LobbySession>,
    slot_index: usize,
}

impl LobbyClient {
    /// Connect and ask for a seat.
    ///
    /// Returns `Ok(None)` when the lobby is full; the host closes the
    /// connection in that case.
    pub async fn join(url: &str, name: &str, avatar_index: u32) -> Result<Option<Self>> {
        let (mut stream, _) = connect_async(url)
            .await
            .context("Failed to connect to WebSocket")?;

        send_message(&mut stream, &ClientMessage::hello(name, avatar_index)).await?;

        loop {
            match next_message(&mut stream).await? {
                Some(ServerMessage::Welcome {
                    lobby,
                    slot_index,
                    roster,
                }) => {
                    log::info!("Joined '{}' in seat {}", lobby, slot_index);
                    let mirror = LobbySession::mirror(lobby, roster, Arc::new(NoopObserver))?;
                    return Ok(Some(Self {
                        stream,
                        mirror: Arc::new(mirror),
                        slot_index,
                    }));
                }
                Some(ServerMessage::LobbyFull) => {
                    log::info!("Lobby is full");
                    let _ = stream.close(None).await;
                    return Ok(None);
                }
                Some(ServerMessage::Error { message }) => bail!("Server rejected hello: {message}"),
                Some(other) => log::debug!("Ignoring {} before welcome", other),
                None => bail!("Connection closed before welcome"),
            }
        }
    }

    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    /// Local copy of the host's roster
    pub fn mirror(&self) -> &Arc<LobbySession> {
        &self.mirror
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        send_message(&mut self.stream, message).await
    }

    /// Wait for the next event, applying any roster to the mirror.
    pub async fn next_event(&mut self) -> Result<ClientEvent> {
        loop {
            let message = next_message(&mut self.stream).await?;
            if let Some(event) = self.apply(message).await? {
                return Ok(event);
            }
        }
    }

    /// Tell the host we are leaving and close the socket.
    pub async fn leave(mut self) -> Result<()> {
        self.send(&ClientMessage::Leave).await?;
        let _ = self.stream.close(None).await;
        Ok(())
    }

    /// Interactive session: commands from stdin, roster updates from the host.
    pub async fn run(mut self) -> Result<()> {
        println!("{}", self.render().await);
        println!("Type 'help' for available commands.\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            // Both branches are cancel-safe; the loser is dropped before the
            // result is handled.
            let input = tokio::select! {
                line = lines.next_line() => Input::Line(line.context("Failed to read input")?),
                message = next_message(&mut self.stream) => Input::Message(message?),
            };

            match input {
                Input::Line(None) => break,
                Input::Line(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Ok(LobbyCommand::Help) => println!("{HELP}"),
                        Ok(LobbyCommand::Show) => println!("{}", self.render().await),
                        Ok(LobbyCommand::Quit) => break,
                        Ok(command) => {
                            if let Some(message) = command.to_message() {
                                self.send(&message).await?;
                            }
                        }
                        Err(e) => eprintln!("{e}"),
                    }
                }
                Input::Message(message) => match self.apply(message).await? {
                    Some(ClientEvent::RosterUpdated(true)) => println!("{}", self.render().await),
                    Some(ClientEvent::Error(message)) => eprintln!("Server: {message}"),
                    Some(ClientEvent::Removed) => {
                        println!("The host removed you from the lobby");
                        return Ok(());
                    }
                    Some(ClientEvent::Closed) => {
                        println!("Server closed connection");
                        return Ok(());
                    }
                    Some(ClientEvent::RosterUpdated(false)) | None => {}
                },
            }
        }

        println!("Leaving...");
        self.leave().await
    }

    async fn apply(&self, message: Option<ServerMessage>) -> Result<Option<ClientEvent>> {
        let event = match message {
            Some(ServerMessage::Roster { roster }) => {
                ClientEvent::RosterUpdated(self.mirror.sync_from(roster).await?)
            }
            Some(ServerMessage::Removed) => ClientEvent::Removed,
            Some(ServerMessage::Error { message }) => ClientEvent::Error(message),
            Some(other) => {
                log::warn!("Unexpected message after welcome: {}", other);
                return Ok(None);
            }
            None => ClientEvent::Closed,
        };
        Ok(Some(event))
    }

    async fn render(&self) -> String {
        render_roster(&self.mirror.snapshot().await, self.slot_index)
    }
}

enum Input {
    Line(Option<String>),
    Message(Option<ServerMessage>),
}

async fn send_message(stream: &mut WsStream, message: &ClientMessage) -> Result<()> {
    let json = message.to_json()?;
    stream
        .send(Message::text(json))
        .await
        .context("Failed to send message")
}

/// Next server message, skipping control frames. `None` once closed.
async fn next_message(stream: &mut WsStream) -> Result<Option<ServerMessage>> {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => return Ok(Some(ServerMessage::from_json(text.as_str())?)),
            Ok(Message::Close(_)) => return Ok(None),
            Ok(_) => continue,
            Err(e) => {
                log::debug!("WebSocket error: {}", e);
                return Ok(None);
            }
        }
    }
    Ok(None)
}

/// Text rendering of a roster, marking the viewer's seat.
pub fn render_roster(snapshot: &RosterSnapshot, my_seat: usize) -> String {
    let mut out = format!(
        "=== Lobby ({}, {}/{} seated) ===\n",
        snapshot.phase,
        snapshot.occupied_count(),
        snapshot.slots.len()
    );

    for slot in &snapshot.slots {
        let name = match slot.slot_type() {
            SlotType::Open => "-".to_string(),
            _ if slot.index() == my_seat => format!("{} (you)", slot.name()),
            _ => slot.name().to_string(),
        };
        let avatar = slot
            .avatar_index()
            .map(|avatar| format!("avatar {avatar}"))
            .unwrap_or_default();
        let ready = if slot.is_ready() { "ready" } else { "" };

        let _ = writeln!(
            out,
            "  {:<2} {:<20} {:<7} {:<10} {}",
            slot.index(),
            name,
            slot.slot_type(),
            avatar,
            ready
        );
    }

    out
}
