//! Who may touch which seat.
//!
//! The predicates are independent: callers check exactly the one matching the
//! operation they are about to perform. None of them is enforced by the roster
//! itself.

use super::slot::SlotType;

/// Seat permissions for one process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityPolicy {
    has_authority: bool,
}

impl AuthorityPolicy {
    /// The hosting process
    pub const HOST: Self = Self {
        has_authority: true,
    };

    /// A remote viewer mirroring someone else's roster
    pub const MIRROR: Self = Self {
        has_authority: false,
    };

    pub fn new(has_authority: bool) -> Self {
        Self { has_authority }
    }

    pub fn has_authority(&self) -> bool {
        self.has_authority
    }

    /// Name, avatar and AI options of host-owned seats.
    ///
    /// Remote players edit their own seat through the self-service path, and
    /// an open seat has nothing to edit.
    pub fn may_edit(&self, slot_type: SlotType) -> bool {
        self.has_authority && !matches!(slot_type, SlotType::Remote | SlotType::Open)
    }

    /// Driving the seat: anything not ceded to a remote player
    pub fn may_control(&self, slot_type: SlotType) -> bool {
        self.has_authority && slot_type != SlotType::Remote
    }

    /// Vacating or resetting the seat
    pub fn may_remove(&self, _slot_type: SlotType) -> bool {
        self.has_authority
    }
}
