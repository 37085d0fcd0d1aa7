//! Error types for room sessions.

use bridge_core::FfiError;
use bridge_media::MediaError;
use bridge_proto::TrackKind;
use thiserror::Error;

/// Errors that can occur while joining or using a room.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The engine refused the connection.
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// The engine failed to send a data packet.
    #[error("Failed to publish data: {0}")]
    PublishData(String),

    /// The engine failed to publish a track.
    #[error("Failed to publish track: {0}")]
    PublishTrack(String),

    /// The engine failed to unpublish a track.
    #[error("Failed to unpublish track: {0}")]
    UnpublishTrack(String),

    /// The room is not connected.
    #[error("Room is not connected")]
    NotConnected,

    /// The room was already connected once.
    #[error("Room is already connected")]
    AlreadyConnected,

    /// An event referenced a participant the room does not know.
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    /// An event referenced a publication the room does not know.
    #[error("Unknown track publication: {0}")]
    UnknownPublication(String),

    /// The engine announced a participant twice.
    #[error("Participant already exists: {0}")]
    ParticipantExists(String),

    /// A stream was requested on a track of the wrong kind.
    #[error("Expected a {expected:?} track, got {actual:?}")]
    WrongTrackKind {
        expected: TrackKind,
        actual: TrackKind,
    },

    /// A completion event of the wrong kind carried the awaited async id.
    #[error("Unexpected completion event: {0}")]
    UnexpectedEvent(&'static str),

    /// Talking to the engine failed.
    #[error(transparent)]
    Ffi(#[from] FfiError),

    /// A media operation failed.
    #[error(transparent)]
    Media(#[from] MediaError),
}
