//! Room sessions over the media engine bridge.
//!
//! A [`Room`] joins a session through the engine and keeps a local view of
//! its participants and their track publications up to date. Engine events
//! are consumed by a per-room dispatch loop which:
//!
//! - applies room-scoped events to the participant state and reports them as
//!   typed [`RoomEvent`]s on channels from [`Room::subscribe`];
//! - forwards every event to the room bus, where local participant
//!   operations wait for their completions;
//! - waits for the room bus to drain before taking the next event.
//!
//! When the loop fails, the room becomes [`SessionState::Faulted`] and every
//! pending wait on the room bus fails immediately.

mod error;
mod events;
mod metrics;
mod participant;
mod publication;
mod room;
mod state;
mod track;

pub use error::RoomError;
pub use events::RoomEvent;
pub use metrics::{DispatchMetrics, DispatchStats};
pub use participant::{LocalParticipant, Participant, ParticipantRef, RemoteParticipant};
pub use publication::{LocalTrackPublication, RemoteTrackPublication, TrackPublication};
pub use room::Room;
pub use state::SessionState;
pub use track::{LocalTrack, RemoteTrack, Track};

pub use bridge_proto::{
    ConnectionQuality, ConnectionState, DataPacketKind, E2eeOptions, E2eeState, EncryptionType,
    KeyProviderOptions, RoomOptions, TrackKind, TrackPublishOptions, TrackSource, VideoCodec,
};

/// Typed events buffered per listener before new ones are dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result type for room operations.
pub type RoomResult<T> = Result<T, RoomError>;
