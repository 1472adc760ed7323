//! Binding remote players to open seats.

use std::sync::Arc;

use super::{
    errors::{LobbyError, LobbyResult},
    roster::Roster,
    slot::{Slot, SlotType},
};

/// Claims and releases seats on behalf of remote players.
///
/// Seat assignment is first-fit in index order, so the same sequence of
/// connects and disconnects always yields the same seat indices.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    roster: Arc<Roster>,
}

impl ConnectionManager {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }

    /// Seat a remote player in the lowest-indexed open slot.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(index))` - Seat claimed
    /// * `Ok(None)` - Lobby full; nothing changed and nobody was notified
    ///
    /// # Errors
    ///
    /// * `InvalidName` - `name` is blank
    /// * `SessionEnded` - The match already started or the lobby closed
    pub async fn connect(&self, name: &str, avatar_index: u32) -> LobbyResult<Option<usize>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LobbyError::InvalidName(name.to_string()));
        }

        let claimed = self
            .roster
            .replace_first(|slot| {
                (slot.slot_type() == SlotType::Open)
                    .then(|| Slot::remote(slot.index(), name, avatar_index))
            })
            .await?;

        match claimed {
            Some(index) => log::info!("{} took seat {} (avatar {})", name, index, avatar_index),
            None => log::info!("{} turned away, lobby full", name),
        }

        Ok(claimed)
    }

    /// Release a seat back to open.
    ///
    /// Idempotent: releasing an open seat leaves it unchanged but still
    /// notifies observers.
    pub async fn disconnect(&self, index: usize) -> LobbyResult<()> {
        let mut previous = None;
        self.roster
            .update_slot(index, |slot| {
                previous = Some(slot.clone());
                Ok(Slot::open(slot.index()))
            })
            .await?;

        match previous {
            Some(slot) if slot.slot_type().is_host_owned() => {
                log::warn!("Host-owned seat {} ({}) vacated", index, slot.name());
            }
            Some(slot) if slot.slot_type() == SlotType::Remote => {
                log::info!("{} left seat {}", slot.name(), index);
            }
            _ => log::debug!("Seat {} already open", index),
        }

        Ok(())
    }
}
