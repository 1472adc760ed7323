//! Lobby module: seats, roster, permissions and remote seat claims.
//!
//! This module implements:
//! - Slot: a single seat and its invariants
//! - Roster: the fixed-size, lock-protected set of seats for one session
//! - AuthorityPolicy: who may edit, control or remove a seat
//! - ConnectionManager: first-fit seat claims for remote players
//! - RosterObserver: synchronous change notification, with a broadcast fan-out
//! - LobbySession: the owner of one roster, host or mirror
//!
//! ## Architecture
//!
//! A `LobbySession` is created once per lobby and shared between connection
//! handlers as `Arc<LobbySession>`. Every mutation takes the roster's write
//! lock, so "find an open seat, then claim it" can never race with another
//! claim. The observer is called before the lock is released and receives a
//! full snapshot; transports forward it to their clients.
//!
//! ## Example
//!
//! ```
//! use card_lobby::lobby::{LobbyConfig, LobbySession, RosterBroadcaster, StaticAvatars};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let broadcaster = RosterBroadcaster::default();
//!     let mut updates = broadcaster.subscribe();
//!     let session = LobbySession::host(
//!         &LobbyConfig::default(),
//!         &StaticAvatars(vec![0]),
//!         Arc::new(broadcaster),
//!     )
//!     .unwrap();
//!
//!     assert_eq!(session.connect_player("Bob", 3).await, Ok(Some(1)));
//!     assert_eq!(session.connect_player("Cara", 7).await, Ok(None));
//!     assert_eq!(updates.recv().await.unwrap().remote_count(), 1);
//! }
//! ```

pub mod config;
pub mod connection;
pub mod errors;
pub mod notifier;
pub mod policy;
pub mod roster;
pub mod session;
pub mod slot;

pub use config::{AvatarResolver, LobbyConfig, MAX_SLOTS, MIN_SLOTS, StaticAvatars};
pub use connection::ConnectionManager;
pub use errors::{LobbyError, LobbyResult};
pub use notifier::{NoopObserver, ObserverSet, RosterBroadcaster, RosterObserver};
pub use policy::AuthorityPolicy;
pub use roster::{LobbyPhase, Roster, RosterSnapshot};
pub use session::{LobbySession, SlotUpdate};
pub use slot::{AiOption, Slot, SlotType};
