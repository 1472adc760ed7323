//! Protocol versioning for compatibility checks.

use serde::{Deserialize, Serialize};

use super::errors::{ProtocolError, Result};

/// Lobby protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// V1: JSON hello/roster protocol
    V1,
}

impl ProtocolVersion {
    /// Get the current protocol version
    pub fn current() -> Self {
        ProtocolVersion::V1
    }

    /// Check if this version is compatible with another
    pub fn is_compatible_with(&self, other: &ProtocolVersion) -> bool {
        matches!((self, other), (ProtocolVersion::V1, ProtocolVersion::V1))
    }

    /// Fail unless a peer announcing `theirs` can talk to us
    pub fn negotiate(theirs: ProtocolVersion) -> Result<Self> {
        let ours = Self::current();
        if ours.is_compatible_with(&theirs) {
            Ok(ours)
        } else {
            Err(ProtocolError::IncompatibleVersion { ours, theirs })
        }
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}
