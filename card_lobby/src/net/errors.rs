//! Protocol error types for encoding and decoding lobby messages.

use thiserror::Error;

use super::protocol_version::ProtocolVersion;

/// Errors that can occur while reading or writing wire messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not a valid message
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// Message size exceeded maximum allowed
    #[error("Message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },

    /// Peer speaks a protocol version we cannot talk to
    #[error("Incompatible protocol version {theirs:?} (server speaks {ours:?})")]
    IncompatibleVersion {
        ours: ProtocolVersion,
        theirs: ProtocolVersion,
    },

    /// Well-formed message that is not valid at this point of the conversation
    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
