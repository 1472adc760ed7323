//! # Card Lobby
//!
//! Pre-match multiplayer lobby for a card game host.
//!
//! A hosting process offers a fixed number of seats. Remote players claim open
//! seats and release them when they leave; the host decides what happens to the
//! seats it owns (its local player and any AI players). Every change to the
//! roster is pushed to observers as a complete snapshot so that the host's own
//! view and every remote viewer render the same state.
//!
//! ## Seat types
//!
//! - **Local**: the human at the host
//! - **Ai**: a computer player owned by the host
//! - **Open**: vacant, waiting for a remote player
//! - **Remote**: claimed by a connected remote player
//!
//! ## Core Modules
//!
//! - [`lobby`]: Seats, roster, permission policy and seat claims
//! - [`net`]: Wire messages exchanged between host and remote players
//!
//! ## Example
//!
//! ```
//! use card_lobby::{LobbyConfig, LobbySession, NoopObserver, StaticAvatars};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LobbyConfig::default();
//!     let lobby = LobbySession::host(&config, &StaticAvatars(vec![0]), Arc::new(NoopObserver))
//!         .unwrap();
//!
//!     let seat = lobby.connect_player("Bob", 3).await.unwrap();
//!     assert_eq!(seat, Some(1));
//!     assert!(lobby.may_edit(0).await.unwrap());
//!     assert!(!lobby.may_edit(1).await.unwrap());
//! }
//! ```

/// Seats, roster, permissions and seat claims.
pub mod lobby;
pub use lobby::{
    AiOption, AuthorityPolicy, AvatarResolver, LobbyConfig, LobbyError, LobbyPhase, LobbyResult,
    LobbySession, NoopObserver, ObserverSet, RosterBroadcaster, RosterObserver, RosterSnapshot,
    Slot, SlotType, SlotUpdate, StaticAvatars,
};

/// Wire protocol between the hosting process and remote players.
pub mod net;
pub use net::{messages, protocol_version::ProtocolVersion};
