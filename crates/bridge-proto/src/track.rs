//! Track and publication descriptions.

use serde::{Deserialize, Serialize};

use crate::e2ee::EncryptionType;
use crate::handle::OwnedHandle;

/// Media kind of a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    #[default]
    Unknown,
    Audio,
    Video,
}

/// Where a track's media comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    #[default]
    Unknown,
    Camera,
    Microphone,
    ScreenShare,
    ScreenShareAudio,
}

/// Whether media is currently flowing on a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    #[default]
    Unknown,
    Active,
    Paused,
}

/// Video codec requested when publishing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    #[default]
    Vp8,
    H264,
    Av1,
    Vp9,
}

/// Static information about a track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackInfo {
    pub sid: String,
    pub name: String,
    pub kind: TrackKind,
    pub stream_state: StreamState,
    pub muted: bool,
    pub remote: bool,
}

/// A track together with the engine handle that keeps it alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedTrack {
    pub handle: OwnedHandle,
    pub info: TrackInfo,
}

/// Static information about a track publication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackPublicationInfo {
    pub sid: String,
    pub name: String,
    pub kind: TrackKind,
    pub source: TrackSource,
    pub simulcasted: bool,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub muted: bool,
    pub remote: bool,
    pub encryption_type: EncryptionType,
}

/// A publication together with the engine handle that keeps it alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedTrackPublication {
    pub handle: OwnedHandle,
    pub info: TrackPublicationInfo,
}

/// Create a local audio track fed by an audio source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAudioTrackRequest {
    pub name: String,
    pub source_handle: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAudioTrackResponse {
    pub track: OwnedTrack,
}

/// Create a local video track fed by a video source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoTrackRequest {
    pub name: String,
    pub source_handle: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateVideoTrackResponse {
    pub track: OwnedTrack,
}
