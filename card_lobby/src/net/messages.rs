use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    errors::{ProtocolError, Result},
    protocol_version::ProtocolVersion,
};
use crate::lobby::{RosterSnapshot, SlotUpdate};

/// Largest text frame either side accepts
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024;

/// A message from a remote player to the host.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First frame on a new connection: who the player is. The host answers
    /// with `Welcome` or `LobbyFull`.
    Hello {
        #[serde(default)]
        version: ProtocolVersion,
        name: String,
        avatar_index: u32,
    },
    /// Self-service edit of the player's own seat.
    UpdateSeat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar_index: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ready: Option<bool>,
    },
    /// Player is leaving. Closing the socket has the same effect.
    Leave,
}

impl ClientMessage {
    pub fn hello(name: impl Into<String>, avatar_index: u32) -> Self {
        Self::Hello {
            version: ProtocolVersion::current(),
            name: name.into(),
            avatar_index,
        }
    }

    /// The seat edit carried by an `UpdateSeat`, limited to the fields a remote
    /// player may change
    pub fn seat_update(&self) -> Option<SlotUpdate> {
        match self {
            Self::UpdateSeat {
                name,
                avatar_index,
                ready,
            } => Some(SlotUpdate {
                name: name.clone(),
                avatar_index: *avatar_index,
                ready: *ready,
                ..SlotUpdate::default()
            }),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        check_size(text)?;
        Ok(serde_json::from_str(text)?)
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Hello {
                name, avatar_index, ..
            } => write!(f, "hello from {name} (avatar {avatar_index})"),
            Self::UpdateSeat { .. } => write!(f, "seat update"),
            Self::Leave => write!(f, "leave"),
        }
    }
}

/// A message from the host to a remote player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The player got a seat.
    Welcome {
        lobby: String,
        slot_index: usize,
        roster: RosterSnapshot,
    },
    /// No open seat; the host closes the connection after sending this.
    LobbyFull,
    /// The roster changed.
    Roster { roster: RosterSnapshot },
    /// The host vacated the player's seat; the connection is closed.
    Removed,
    /// The player's last message could not be processed.
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        check_size(text)?;
        Ok(serde_json::from_str(text)?)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Welcome {
                lobby, slot_index, ..
            } => write!(f, "welcome to {lobby}, seat {slot_index}"),
            Self::LobbyFull => write!(f, "lobby full"),
            Self::Roster { roster } => write!(f, "roster v{}", roster.version),
            Self::Removed => write!(f, "removed from seat"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

fn check_size(text: &str) -> Result<()> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            actual: text.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}
