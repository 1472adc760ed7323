//! Lobby error types.

use thiserror::Error;

use super::{roster::LobbyPhase, slot::SlotType};

/// Lobby errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LobbyError {
    /// Slot index outside `[0, slot_count)`
    #[error("Slot index {index} out of range (lobby has {count} slots)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Display name is empty or whitespace
    #[error("Invalid player name: {0:?}")]
    InvalidName(String),

    /// Slot contents violate the slot invariants
    #[error("Invalid slot {index}: {reason}")]
    InvalidSlot { index: usize, reason: String },

    /// Slot type change that an edit may not perform
    #[error("Cannot change slot type from {from} to {to}")]
    InvalidTransition { from: SlotType, to: SlotType },

    /// Match cannot start while a seat is vacant
    #[error("Seat {0} is still open")]
    SeatOpen(usize),

    /// Match cannot start while a remote player is not ready
    #[error("Player in seat {0} is not ready")]
    NotReady(usize),

    /// Roster is frozen because the session has moved past the lobby
    #[error("Lobby session is no longer accepting changes ({0})")]
    SessionEnded(LobbyPhase),

    /// Lobby configuration rejected by validation
    #[error("Invalid lobby configuration: {0}")]
    InvalidConfig(String),

    /// Local mutation attempted on a mirror of someone else's roster
    #[error("Roster is a read-only mirror of the host")]
    NotAuthoritative,

    /// Snapshot cannot be applied to this roster
    #[error("Snapshot does not match roster: {0}")]
    SnapshotMismatch(String),
}

impl LobbyError {
    /// Whether the error was caused by the request rather than the lobby's state.
    ///
    /// Transports map these to client errors (e.g. HTTP 400/404) and the rest to
    /// conflicts.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            LobbyError::IndexOutOfRange { .. }
                | LobbyError::InvalidName(_)
                | LobbyError::InvalidSlot { .. }
                | LobbyError::InvalidTransition { .. }
        )
    }
}

/// Result type for lobby operations
pub type LobbyResult<T> = Result<T, LobbyError>;
