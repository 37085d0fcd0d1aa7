//! Room session messages.

use serde::{Deserialize, Serialize};

use crate::e2ee::{E2eeOptions, E2eeState};
use crate::handle::OwnedHandle;
use crate::participant::OwnedParticipant;
use crate::track::{OwnedTrack, OwnedTrackPublication, TrackSource, VideoCodec};

/// Options used when joining a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomOptions {
    /// Subscribe to remote tracks as soon as they are published.
    pub auto_subscribe: bool,

    /// Let the server pause layers nobody is watching.
    pub dynacast: bool,

    /// End-to-end encryption settings (None disables encryption).
    pub e2ee: Option<E2eeOptions>,
}

/// Options used when publishing a local track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackPublishOptions {
    /// Codec for video tracks.
    pub video_codec: VideoCodec,

    /// Publish several resolutions of a video track.
    pub simulcast: bool,

    /// Declared source of the track.
    pub source: TrackSource,
}

/// Signal-level connection state of a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Reconnecting,
}

/// Link quality reported for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Poor,
    Lost,
}

/// Delivery guarantee for user data packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPacketKind {
    Lossy,
    #[default]
    Reliable,
}

/// Static information about a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomInfo {
    pub sid: String,
    pub name: String,
    pub metadata: String,
}

/// A room together with the engine handle that keeps it alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedRoom {
    pub handle: OwnedHandle,
    pub info: RoomInfo,
}

/// A byte buffer owned by the engine until its handle is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedBuffer {
    pub handle: OwnedHandle,
    pub data: Vec<u8>,
}

/// A remote participant and the tracks it had published when we joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantWithTracks {
    pub participant: OwnedParticipant,
    pub publications: Vec<OwnedTrackPublication>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub url: String,
    pub token: String,
    pub options: RoomOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectResponse {
    pub async_id: u64,
}

/// Completion of a [`ConnectRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectCallback {
    pub async_id: u64,
    pub error: Option<String>,
    pub room: OwnedRoom,
    pub local_participant: OwnedParticipant,
    pub participants: Vec<ParticipantWithTracks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectRequest {
    pub room_handle: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisconnectResponse {
    pub async_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisconnectCallback {
    pub async_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishDataRequest {
    pub local_participant_handle: u64,
    pub data: Vec<u8>,
    pub kind: DataPacketKind,
    pub destination_sids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishDataResponse {
    pub async_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishDataCallback {
    pub async_id: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishTrackRequest {
    pub local_participant_handle: u64,
    pub track_handle: u64,
    pub options: TrackPublishOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishTrackResponse {
    pub async_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishTrackCallback {
    pub async_id: u64,
    pub error: Option<String>,
    pub publication: OwnedTrackPublication,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpublishTrackRequest {
    pub local_participant_handle: u64,
    pub track_sid: String,
    pub stop_on_unpublish: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnpublishTrackResponse {
    pub async_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnpublishTrackCallback {
    pub async_id: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSubscribedRequest {
    pub subscribe: bool,
    pub publication_handle: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetSubscribedResponse {}

/// An engine event scoped to one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEvent {
    /// Handle of the room the event belongs to.
    pub room_handle: u64,

    /// What happened.
    pub message: RoomEventKind,
}

/// The kinds of room-scoped events the engine emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomEventKind {
    ParticipantConnected {
        info: OwnedParticipant,
    },
    ParticipantDisconnected {
        participant_sid: String,
    },
    LocalTrackPublished {
        track_sid: String,
    },
    LocalTrackUnpublished {
        publication_sid: String,
    },
    TrackPublished {
        participant_sid: String,
        publication: OwnedTrackPublication,
    },
    TrackUnpublished {
        participant_sid: String,
        publication_sid: String,
    },
    TrackSubscribed {
        participant_sid: String,
        track: OwnedTrack,
    },
    TrackUnsubscribed {
        participant_sid: String,
        track_sid: String,
    },
    TrackSubscriptionFailed {
        participant_sid: String,
        track_sid: String,
        error: String,
    },
    TrackMuted {
        participant_sid: String,
        track_sid: String,
    },
    TrackUnmuted {
        participant_sid: String,
        track_sid: String,
    },
    ActiveSpeakersChanged {
        participant_sids: Vec<String>,
    },
    ConnectionQualityChanged {
        participant_sid: String,
        quality: ConnectionQuality,
    },
    DataReceived {
        data: OwnedBuffer,
        participant_sid: Option<String>,
        kind: DataPacketKind,
    },
    E2eeStateChanged {
        participant_sid: String,
        state: E2eeState,
    },
    ConnectionStateChanged {
        state: ConnectionState,
    },
    Disconnected,
    Reconnecting,
    Reconnected,
}
