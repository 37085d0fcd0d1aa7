//! Participant descriptions.

use serde::{Deserialize, Serialize};

use crate::handle::OwnedHandle;

/// Static information about a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantInfo {
    /// Server-assigned participant id.
    pub sid: String,

    /// Display name.
    pub name: String,

    /// Application identity.
    pub identity: String,

    /// Application metadata.
    pub metadata: String,
}

/// A participant together with the engine handle that keeps it alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedParticipant {
    pub handle: OwnedHandle,
    pub info: ParticipantInfo,
}
