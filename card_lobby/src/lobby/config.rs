//! Lobby configuration models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{
    errors::{LobbyError, LobbyResult},
    slot::AiOption,
};

/// Most seats a lobby can offer
pub const MAX_SLOTS: usize = 8;

/// Fewest seats a lobby can offer (the host plus one)
pub const MIN_SLOTS: usize = 2;

/// Lobby configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Lobby name shown to joining players
    pub name: String,

    /// Display name of the human at the host (seat 0)
    pub host_name: String,

    /// Total number of seats (default: 2)
    pub slot_count: usize,

    /// Seats after the host's that start as AI players (default: 0)
    pub ai_seats: usize,

    /// Options applied to every AI seat
    pub ai_options: BTreeSet<AiOption>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            name: "Lobby".to_string(),
            host_name: "Host".to_string(),
            slot_count: MIN_SLOTS,
            ai_seats: 0,
            ai_options: BTreeSet::new(),
        }
    }
}

impl LobbyConfig {
    /// Validate configuration
    pub fn validate(&self) -> LobbyResult<()> {
        if self.name.trim().is_empty() {
            return Err(LobbyError::InvalidConfig(
                "Lobby name must not be empty".to_string(),
            ));
        }

        if self.host_name.trim().is_empty() {
            return Err(LobbyError::InvalidConfig(
                "Host name must not be empty".to_string(),
            ));
        }

        if !(MIN_SLOTS..=MAX_SLOTS).contains(&self.slot_count) {
            return Err(LobbyError::InvalidConfig(format!(
                "Slot count must be between {} and {}",
                MIN_SLOTS, MAX_SLOTS
            )));
        }

        if self.ai_seats >= self.slot_count {
            return Err(LobbyError::InvalidConfig(format!(
                "At most {} AI seats fit next to the host",
                self.slot_count - 1
            )));
        }

        Ok(())
    }

    /// Seats left for remote players
    pub fn open_seats(&self) -> usize {
        self.slot_count.saturating_sub(1 + self.ai_seats)
    }
}

/// Supplies avatar handles for host-owned seats.
///
/// The catalog itself lives with the UI; the lobby only needs integers.
pub trait AvatarResolver {
    /// Preferred avatars for the host's seats, in seat order
    fn local_avatar_indices(&self) -> Vec<u32>;
}

/// Fixed avatar list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAvatars(pub Vec<u32>);

impl AvatarResolver for StaticAvatars {
    fn local_avatar_indices(&self) -> Vec<u32> {
        self.0.clone()
    }
}

/// Avatar for host-owned seat `seat`, falling back to the seat number
pub(crate) fn avatar_for_seat(avatars: &[u32], seat: usize) -> u32 {
    avatars
        .get(seat)
        .copied()
        .unwrap_or_else(|| u32::try_from(seat).unwrap_or(u32::MAX))
}
