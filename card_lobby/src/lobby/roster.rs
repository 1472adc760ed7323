//! Lobby roster: the ordered, fixed-size set of seats for one session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    errors::{LobbyError, LobbyResult},
    notifier::RosterObserver,
    slot::{Slot, SlotType},
};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyPhase {
    /// Seats may be claimed, released and edited
    Waiting,
    /// Match started, roster frozen
    Started,
    /// Lobby torn down, roster frozen
    Closed,
}

impl std::fmt::Display for LobbyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyPhase::Waiting => write!(f, "waiting"),
            LobbyPhase::Started => write!(f, "started"),
            LobbyPhase::Closed => write!(f, "closed"),
        }
    }
}

/// Point-in-time copy of the roster handed to observers and sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// Bumped on every mutation
    pub version: u64,

    /// Session phase
    pub phase: LobbyPhase,

    /// Seats in index order
    pub slots: Vec<Slot>,
}

impl RosterSnapshot {
    /// Number of seats that are not open
    pub fn occupied_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.slot_type().is_occupied())
            .count()
    }

    /// Number of seats held by remote players
    pub fn remote_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.slot_type() == SlotType::Remote)
            .count()
    }
}

struct RosterState {
    slots: Vec<Slot>,
    version: u64,
    phase: LobbyPhase,
}

impl RosterState {
    fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            version: self.version,
            phase: self.phase,
            slots: self.slots.clone(),
        }
    }

    fn ensure_waiting(&self) -> LobbyResult<()> {
        match self.phase {
            LobbyPhase::Waiting => Ok(()),
            phase => Err(LobbyError::SessionEnded(phase)),
        }
    }
}

/// Ordered collection of seats, fixed in size for the session.
///
/// Every mutation runs under one write lock and notifies the observer exactly
/// once, after the change and before the lock is released.
pub struct Roster {
    state: RwLock<RosterState>,
    slot_count: usize,
    authoritative: bool,
    observer: Arc<dyn RosterObserver>,
}

impl Roster {
    /// Build a roster from its initial seats.
    ///
    /// Seats must be indexed `0..n` in order and each must be valid.
    pub fn new(slots: Vec<Slot>, observer: Arc<dyn RosterObserver>) -> LobbyResult<Self> {
        Self::build(slots, 0, LobbyPhase::Waiting, true, observer)
    }

    /// Read-only copy of a host's roster, changed only by `load_snapshot`.
    pub(crate) fn mirror_of(
        snapshot: RosterSnapshot,
        observer: Arc<dyn RosterObserver>,
    ) -> LobbyResult<Self> {
        Self::build(
            snapshot.slots,
            snapshot.version,
            snapshot.phase,
            false,
            observer,
        )
    }

    fn build(
        slots: Vec<Slot>,
        version: u64,
        phase: LobbyPhase,
        authoritative: bool,
        observer: Arc<dyn RosterObserver>,
    ) -> LobbyResult<Self> {
        if slots.is_empty() {
            return Err(LobbyError::InvalidConfig(
                "Roster needs at least one slot".to_string(),
            ));
        }
        check_slots(&slots)?;

        Ok(Self {
            slot_count: slots.len(),
            authoritative,
            state: RwLock::new(RosterState {
                slots,
                version,
                phase,
            }),
            observer,
        })
    }

    /// Whether local mutations are allowed
    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    fn ensure_authoritative(&self) -> LobbyResult<()> {
        if self.authoritative {
            Ok(())
        } else {
            Err(LobbyError::NotAuthoritative)
        }
    }

    /// Number of seats, fixed for the session
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn check_index(&self, index: usize) -> LobbyResult<()> {
        if index < self.slot_count {
            Ok(())
        } else {
            Err(LobbyError::IndexOutOfRange {
                index,
                count: self.slot_count,
            })
        }
    }

    /// Copy of the seat at `index`
    pub async fn slot_at(&self, index: usize) -> LobbyResult<Slot> {
        self.check_index(index)?;
        let state = self.state.read().await;
        Ok(state.slots[index].clone())
    }

    /// Copy of the whole roster
    pub async fn snapshot(&self) -> RosterSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn phase(&self) -> LobbyPhase {
        self.state.read().await.phase
    }

    /// Atomically replace one seat
    pub async fn replace_slot(&self, index: usize, slot: Slot) -> LobbyResult<()> {
        self.ensure_authoritative()?;
        self.check_index(index)?;
        if slot.index() != index {
            return Err(LobbyError::InvalidSlot {
                index,
                reason: format!("replacement carries index {}", slot.index()),
            });
        }
        slot.validate()?;

        let mut state = self.state.write().await;
        state.ensure_waiting()?;
        state.slots[index] = slot;
        self.commit(&mut state);
        Ok(())
    }

    /// Replace the first seat, in index order, for which `select` yields a
    /// replacement. Returns its index, or `None` when no seat matched (no
    /// notification in that case).
    pub(crate) async fn replace_first<F>(&self, mut select: F) -> LobbyResult<Option<usize>>
    where
        F: FnMut(&Slot) -> Option<Slot>,
    {
        self.ensure_authoritative()?;
        let mut state = self.state.write().await;
        state.ensure_waiting()?;

        let found = state
            .slots
            .iter()
            .find_map(|slot| select(slot).map(|replacement| (slot.index(), replacement)));

        let Some((index, replacement)) = found else {
            return Ok(None);
        };

        replacement.validate()?;
        state.slots[index] = replacement;
        self.commit(&mut state);
        Ok(Some(index))
    }

    /// Read-modify-write one seat under the write lock.
    ///
    /// `update` sees the current seat and returns its replacement; the result
    /// is validated before it is stored. Notifies even when the replacement
    /// equals the current seat.
    pub(crate) async fn update_slot<F>(&self, index: usize, update: F) -> LobbyResult<Slot>
    where
        F: FnOnce(&Slot) -> LobbyResult<Slot>,
    {
        self.ensure_authoritative()?;
        self.check_index(index)?;

        let mut state = self.state.write().await;
        state.ensure_waiting()?;

        let replacement = update(&state.slots[index])?;
        if replacement.index() != index {
            return Err(LobbyError::InvalidSlot {
                index,
                reason: format!("replacement carries index {}", replacement.index()),
            });
        }
        replacement.validate()?;

        state.slots[index] = replacement.clone();
        self.commit(&mut state);
        Ok(replacement)
    }

    /// Freeze the roster for the match.
    ///
    /// Every seat must be occupied and every remote player ready.
    pub(crate) async fn start(&self) -> LobbyResult<RosterSnapshot> {
        self.ensure_authoritative()?;
        let mut state = self.state.write().await;
        state.ensure_waiting()?;

        for slot in &state.slots {
            if !slot.slot_type().is_occupied() {
                return Err(LobbyError::SeatOpen(slot.index()));
            }
            if !slot.counts_as_ready() {
                return Err(LobbyError::NotReady(slot.index()));
            }
        }

        state.phase = LobbyPhase::Started;
        self.commit(&mut state);
        Ok(state.snapshot())
    }

    /// Tear the lobby down. Closing twice, or closing a mirror, is a no-op.
    pub(crate) async fn close(&self) {
        if !self.authoritative {
            log::debug!("Mirror roster left as the host last sent it");
            return;
        }
        let mut state = self.state.write().await;
        if state.phase == LobbyPhase::Closed {
            return;
        }
        state.phase = LobbyPhase::Closed;
        self.commit(&mut state);
    }

    /// Overwrite the roster with a host's snapshot.
    ///
    /// Used by mirrors. Snapshots not newer than the current version are
    /// ignored and `Ok(false)` is returned.
    pub(crate) async fn load_snapshot(&self, snapshot: RosterSnapshot) -> LobbyResult<bool> {
        if snapshot.slots.len() != self.slot_count {
            return Err(LobbyError::SnapshotMismatch(format!(
                "expected {} slots, got {}",
                self.slot_count,
                snapshot.slots.len()
            )));
        }
        check_slots(&snapshot.slots)?;

        let mut state = self.state.write().await;
        if snapshot.version <= state.version {
            log::debug!(
                "Ignoring stale roster v{} (have v{})",
                snapshot.version,
                state.version
            );
            return Ok(false);
        }

        state.slots = snapshot.slots;
        state.phase = snapshot.phase;
        state.version = snapshot.version;
        self.observer.on_roster_changed(&state.snapshot());
        Ok(true)
    }

    fn commit(&self, state: &mut RosterState) {
        state.version += 1;
        log::debug!("Roster now at v{} ({})", state.version, state.phase);
        self.observer.on_roster_changed(&state.snapshot());
    }
}

impl std::fmt::Debug for Roster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Roster")
            .field("slot_count", &self.slot_count)
            .finish_non_exhaustive()
    }
}

fn check_slots(slots: &[Slot]) -> LobbyResult<()> {
    for (position, slot) in slots.iter().enumerate() {
        if slot.index() != position {
            return Err(LobbyError::InvalidSlot {
                index: position,
                reason: format!("slot at position {} has index {}", position, slot.index()),
            });
        }
        slot.validate()?;
    }
    Ok(())
}
