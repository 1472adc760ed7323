//! Wire protocol between the hosting process and remote players.
//!
//! Messages are JSON text frames, internally tagged by `type`. The transport
//! that carries them lives with the server and client binaries.

/// Protocol error types.
pub mod errors;

/// Message types exchanged over the lobby socket.
pub mod messages;

/// Protocol versioning for compatibility checks on hello.
pub mod protocol_version;
