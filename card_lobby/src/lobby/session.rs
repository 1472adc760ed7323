//! Lobby session: owner of one roster and the operations exposed to transports.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, sync::Arc};

use super::{
    config::{AvatarResolver, LobbyConfig, avatar_for_seat},
    connection::ConnectionManager,
    errors::{LobbyError, LobbyResult},
    notifier::RosterObserver,
    policy::AuthorityPolicy,
    roster::{LobbyPhase, Roster, RosterSnapshot},
    slot::{AiOption, Slot, SlotType},
};

/// Partial edit of one seat. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_type: Option<SlotType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_index: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_options: Option<BTreeSet<AiOption>>,
}

impl SlotUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether the update touches what `may_edit` guards (everything except
    /// the ready flag)
    pub fn edits_content(&self) -> bool {
        self.slot_type.is_some()
            || self.name.is_some()
            || self.avatar_index.is_some()
            || self.ai_options.is_some()
    }

    /// Fields a remote player may set on their own seat
    pub fn is_self_service(&self) -> bool {
        self.slot_type.is_none() && self.ai_options.is_none()
    }

    fn apply(self, slot: &Slot) -> LobbyResult<Slot> {
        let mut updated = slot.clone();

        if let Some(slot_type) = self.slot_type {
            updated = updated.with_type(slot_type)?;
        }
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(LobbyError::InvalidName(name.to_string()));
            }
            updated = updated.with_name(name);
        }
        if let Some(avatar_index) = self.avatar_index {
            updated = updated.with_avatar(avatar_index);
        }
        if let Some(ready) = self.ready {
            updated = updated.with_ready(ready);
        }
        if let Some(ai_options) = self.ai_options {
            updated = updated.with_ai_options(ai_options);
        }

        Ok(updated)
    }
}

/// One lobby, from creation until the match starts or the lobby closes.
///
/// A host session owns the authoritative roster. A mirror session holds a
/// copy of somebody else's roster, kept current with [`LobbySession::sync_from`],
/// and answers `false` to every permission check.
///
/// Share it between connection handlers as `Arc<LobbySession>`.
#[derive(Debug)]
pub struct LobbySession {
    name: String,
    roster: Arc<Roster>,
    policy: AuthorityPolicy,
    connections: ConnectionManager,
}

impl LobbySession {
    /// Create the authoritative lobby for a hosting process.
    ///
    /// Seat 0 is the host's local player, followed by `ai_seats` AI players;
    /// the remaining seats start open.
    pub fn host(
        config: &LobbyConfig,
        avatars: &dyn AvatarResolver,
        observer: Arc<dyn RosterObserver>,
    ) -> LobbyResult<Self> {
        config.validate()?;

        let avatars = avatars.local_avatar_indices();
        let slots = (0..config.slot_count)
            .map(|index| match index {
                0 => Slot::local(0, config.host_name.trim(), avatar_for_seat(&avatars, 0)),
                n if n <= config.ai_seats => Slot::ai(
                    n,
                    format!("AI {}", n),
                    avatar_for_seat(&avatars, n),
                    config.ai_options.clone(),
                ),
                n => Slot::open(n),
            })
            .collect();

        let roster = Arc::new(Roster::new(slots, observer)?);
        log::info!(
            "Lobby '{}' hosting {} seats ({} open)",
            config.name,
            config.slot_count,
            config.open_seats()
        );

        Ok(Self::assemble(config.name.clone(), roster, AuthorityPolicy::HOST))
    }

    /// Create a read-only copy of a remote host's roster
    pub fn mirror(
        name: impl Into<String>,
        snapshot: RosterSnapshot,
        observer: Arc<dyn RosterObserver>,
    ) -> LobbyResult<Self> {
        let roster = Arc::new(Roster::mirror_of(snapshot, observer)?);
        Ok(Self::assemble(name.into(), roster, AuthorityPolicy::MIRROR))
    }

    fn assemble(name: String, roster: Arc<Roster>, policy: AuthorityPolicy) -> Self {
        Self {
            name,
            connections: ConnectionManager::new(roster.clone()),
            roster,
            policy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this process owns the roster
    pub fn has_authority(&self) -> bool {
        self.policy.has_authority()
    }

    pub fn policy(&self) -> AuthorityPolicy {
        self.policy
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn slot_count(&self) -> usize {
        self.roster.slot_count()
    }

    pub async fn slot_at(&self, index: usize) -> LobbyResult<Slot> {
        self.roster.slot_at(index).await
    }

    pub async fn snapshot(&self) -> RosterSnapshot {
        self.roster.snapshot().await
    }

    pub async fn phase(&self) -> LobbyPhase {
        self.roster.phase().await
    }

    /// Seat a remote player; `Ok(None)` when the lobby is full
    pub async fn connect_player(&self, name: &str, avatar_index: u32) -> LobbyResult<Option<usize>> {
        self.connections.connect(name, avatar_index).await
    }

    /// Release a seat back to open
    pub async fn disconnect_player(&self, index: usize) -> LobbyResult<()> {
        self.connections.disconnect(index).await
    }

    pub async fn may_edit(&self, index: usize) -> LobbyResult<bool> {
        let slot = self.roster.slot_at(index).await?;
        Ok(self.policy.may_edit(slot.slot_type()))
    }

    pub async fn may_control(&self, index: usize) -> LobbyResult<bool> {
        let slot = self.roster.slot_at(index).await?;
        Ok(self.policy.may_control(slot.slot_type()))
    }

    pub async fn may_remove(&self, index: usize) -> LobbyResult<bool> {
        let slot = self.roster.slot_at(index).await?;
        Ok(self.policy.may_remove(slot.slot_type()))
    }

    /// Apply a partial edit to one seat atomically.
    ///
    /// Permissions are the caller's responsibility; the edit itself must
    /// leave the seat valid.
    pub async fn apply_update(&self, index: usize, update: SlotUpdate) -> LobbyResult<Slot> {
        let slot = self
            .roster
            .update_slot(index, move |slot| update.apply(slot))
            .await?;
        log::info!("Seat updated: {}", slot);
        Ok(slot)
    }

    /// Start the match, freezing the roster
    pub async fn start_match(&self) -> LobbyResult<RosterSnapshot> {
        let snapshot = self.roster.start().await?;
        log::info!(
            "Lobby '{}' started with {} players",
            self.name,
            snapshot.occupied_count()
        );
        Ok(snapshot)
    }

    /// Tear the lobby down
    pub async fn close(&self) {
        self.roster.close().await;
        log::info!("Lobby '{}' closed", self.name);
    }

    /// Bring a mirror up to date with the host's snapshot.
    ///
    /// Returns whether the snapshot was newer and got applied.
    pub async fn sync_from(&self, snapshot: RosterSnapshot) -> LobbyResult<bool> {
        if self.has_authority() {
            return Err(LobbyError::SnapshotMismatch(
                "host roster cannot be overwritten by a snapshot".to_string(),
            ));
        }
        self.roster.load_snapshot(snapshot).await
    }
}
