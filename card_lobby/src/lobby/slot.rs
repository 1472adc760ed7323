//! Seat model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::errors::{LobbyError, LobbyResult};

/// Who occupies a seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    /// Human playing at the host
    Local,
    /// Computer player owned by the host
    Ai,
    /// Vacant, waiting for a remote player
    Open,
    /// Claimed by a connected remote player
    Remote,
}

impl SlotType {
    /// Seats the host owns outright (never claimed over the network).
    pub fn is_host_owned(self) -> bool {
        matches!(self, SlotType::Local | SlotType::Ai)
    }

    pub fn is_occupied(self) -> bool {
        self != SlotType::Open
    }
}

impl std::fmt::Display for SlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotType::Local => write!(f, "local"),
            SlotType::Ai => write!(f, "ai"),
            SlotType::Open => write!(f, "open"),
            SlotType::Remote => write!(f, "remote"),
        }
    }
}

/// AI behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiOption {
    /// Simulate candidate plays before committing to one
    UseSimulation,
}

impl std::fmt::Display for AiOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiOption::UseSimulation => write!(f, "use_simulation"),
        }
    }
}

/// A single seat in the lobby.
///
/// Slots are values: the roster hands out clones and accepts whole
/// replacements, so nothing outside the roster ever holds a mutable
/// reference into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    index: usize,
    slot_type: SlotType,
    name: String,
    avatar_index: Option<u32>,
    ready: bool,
    ai_options: BTreeSet<AiOption>,
}

impl Slot {
    /// Vacant seat
    pub fn open(index: usize) -> Self {
        Self {
            index,
            slot_type: SlotType::Open,
            name: String::new(),
            avatar_index: None,
            ready: false,
            ai_options: BTreeSet::new(),
        }
    }

    /// Seat for the human at the host
    pub fn local(index: usize, name: impl Into<String>, avatar_index: u32) -> Self {
        Self {
            index,
            slot_type: SlotType::Local,
            name: name.into(),
            avatar_index: Some(avatar_index),
            ready: false,
            ai_options: BTreeSet::new(),
        }
    }

    /// Host-owned computer seat
    pub fn ai(
        index: usize,
        name: impl Into<String>,
        avatar_index: u32,
        ai_options: BTreeSet<AiOption>,
    ) -> Self {
        Self {
            index,
            slot_type: SlotType::Ai,
            name: name.into(),
            avatar_index: Some(avatar_index),
            ready: false,
            ai_options,
        }
    }

    /// Seat claimed by a remote player
    pub fn remote(index: usize, name: impl Into<String>, avatar_index: u32) -> Self {
        Self {
            index,
            slot_type: SlotType::Remote,
            name: name.into(),
            avatar_index: Some(avatar_index),
            ready: false,
            ai_options: BTreeSet::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slot_type(&self) -> SlotType {
        self.slot_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle into the avatar catalog, `None` while unset
    pub fn avatar_index(&self) -> Option<u32> {
        self.avatar_index
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn ai_options(&self) -> &BTreeSet<AiOption> {
        &self.ai_options
    }

    /// Whether the seat is played at the hosting process
    pub fn is_local(&self) -> bool {
        self.slot_type == SlotType::Local
    }

    /// Whether the seat counts as ready for the match to start.
    ///
    /// Host-owned seats are always ready; remote players opt in.
    pub fn counts_as_ready(&self) -> bool {
        match self.slot_type {
            SlotType::Local | SlotType::Ai => true,
            SlotType::Remote => self.ready,
            SlotType::Open => false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_avatar(mut self, avatar_index: u32) -> Self {
        self.avatar_index = Some(avatar_index);
        self
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    pub fn with_ai_options(mut self, ai_options: BTreeSet<AiOption>) -> Self {
        self.ai_options = ai_options;
        self
    }

    /// Change a host-owned seat between `Local` and `Ai`.
    ///
    /// AI options are dropped when leaving `Ai`.
    pub fn with_type(mut self, slot_type: SlotType) -> LobbyResult<Self> {
        if slot_type == self.slot_type {
            return Ok(self);
        }
        if !self.slot_type.is_host_owned() || !slot_type.is_host_owned() {
            return Err(LobbyError::InvalidTransition {
                from: self.slot_type,
                to: slot_type,
            });
        }
        if slot_type != SlotType::Ai {
            self.ai_options.clear();
        }
        self.slot_type = slot_type;
        Ok(self)
    }

    /// Check the slot invariants
    pub fn validate(&self) -> LobbyResult<()> {
        let occupied = self.slot_type.is_occupied();
        let invalid = |reason: &str| LobbyError::InvalidSlot {
            index: self.index,
            reason: reason.to_string(),
        };

        if occupied && self.name.trim().is_empty() {
            return Err(invalid("occupied seat needs a name"));
        }
        if !occupied && !self.name.is_empty() {
            return Err(invalid("open seat cannot have a name"));
        }
        if occupied != self.avatar_index.is_some() {
            return Err(invalid("avatar must be set exactly when the seat is occupied"));
        }
        if self.slot_type != SlotType::Ai && !self.ai_options.is_empty() {
            return Err(invalid("only AI seats carry AI options"));
        }
        if !occupied && self.ready {
            return Err(invalid("open seat cannot be ready"));
        }
        Ok(())
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.avatar_index {
            Some(avatar) => write!(
                f,
                "#{} {} {:?} (avatar {})",
                self.index, self.slot_type, self.name, avatar
            ),
            None => write!(f, "#{} {}", self.index, self.slot_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_satisfy_invariants() {
        let options = BTreeSet::from([AiOption::UseSimulation]);
        for slot in [
            Slot::open(0),
            Slot::local(0, "Alice", 0),
            Slot::ai(1, "AI 1", 4, options),
            Slot::remote(2, "Bob", 3),
        ] {
            assert!(slot.validate().is_ok(), "{slot} should be valid");
        }
    }

    #[test]
    fn test_open_slot_is_unset() {
        let slot = Slot::open(3);
        assert_eq!(slot.index(), 3);
        assert_eq!(slot.slot_type(), SlotType::Open);
        assert_eq!(slot.name(), "");
        assert_eq!(slot.avatar_index(), None);
        assert!(!slot.is_ready());
    }

    #[test]
    fn test_is_local_follows_type() {
        assert!(Slot::local(0, "Alice", 0).is_local());
        assert!(!Slot::remote(1, "Bob", 1).is_local());
        assert!(!Slot::ai(1, "AI 1", 1, BTreeSet::new()).is_local());
    }

    #[test]
    fn test_blank_name_rejected() {
        let slot = Slot::remote(1, "   ", 3);
        assert!(matches!(
            slot.validate(),
            Err(LobbyError::InvalidSlot { index: 1, .. })
        ));
    }

    #[test]
    fn test_ai_options_only_on_ai() {
        let slot = Slot::local(0, "Alice", 0)
            .with_ai_options(BTreeSet::from([AiOption::UseSimulation]));
        assert!(slot.validate().is_err());
    }

    #[test]
    fn test_open_cannot_be_ready() {
        assert!(Slot::open(1).with_ready(true).validate().is_err());
    }

    #[test]
    fn test_type_change_between_host_owned() {
        let slot = Slot::ai(1, "AI 1", 2, BTreeSet::from([AiOption::UseSimulation]))
            .with_type(SlotType::Local)
            .unwrap();
        assert_eq!(slot.slot_type(), SlotType::Local);
        assert!(slot.ai_options().is_empty());
        assert!(slot.validate().is_ok());
    }

    #[test]
    fn test_type_change_to_remote_rejected() {
        let err = Slot::local(0, "Alice", 0)
            .with_type(SlotType::Remote)
            .unwrap_err();
        assert_eq!(
            err,
            LobbyError::InvalidTransition {
                from: SlotType::Local,
                to: SlotType::Remote
            }
        );
        assert!(Slot::open(1).with_type(SlotType::Ai).is_err());
    }

    #[test]
    fn test_counts_as_ready() {
        assert!(Slot::local(0, "Alice", 0).counts_as_ready());
        assert!(!Slot::remote(1, "Bob", 3).counts_as_ready());
        assert!(Slot::remote(1, "Bob", 3).with_ready(true).counts_as_ready());
        assert!(!Slot::open(1).counts_as_ready());
    }

    #[test]
    fn test_slot_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SlotType::Remote).unwrap(), "\"remote\"");
        assert_eq!(SlotType::Ai.to_string(), "ai");
    }
}
