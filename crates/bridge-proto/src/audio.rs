//! Audio frame, source and stream messages.

use serde::{Deserialize, Serialize};

use crate::handle::OwnedHandle;

/// Interleaved signed 16-bit PCM samples plus their layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFrameBufferInfo {
    /// Little-endian i16 samples, interleaved by channel.
    pub data: Vec<u8>,
    pub num_channels: u32,
    pub sample_rate: u32,
    pub samples_per_channel: u32,
}

/// An audio buffer owned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedAudioFrameBuffer {
    pub handle: OwnedHandle,
    pub info: AudioFrameBufferInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStreamType {
    #[default]
    Native,
    Html,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSourceType {
    #[default]
    Native,
}

/// Open a stream of decoded frames from a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAudioStreamRequest {
    pub track_handle: u64,
    pub kind: AudioStreamType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedAudioStream {
    pub handle: OwnedHandle,
    pub kind: AudioStreamType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAudioStreamResponse {
    pub stream: OwnedAudioStream,
}

/// An event scoped to one audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStreamEvent {
    pub stream_handle: u64,
    pub message: AudioStreamMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStreamMessage {
    FrameReceived { frame: OwnedAudioFrameBuffer },
    Eos,
}

/// Create a source that local audio frames are pushed into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAudioSourceRequest {
    pub kind: AudioSourceType,
    pub sample_rate: u32,
    pub num_channels: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedAudioSource {
    pub handle: OwnedHandle,
    pub kind: AudioSourceType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAudioSourceResponse {
    pub source: OwnedAudioSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureAudioFrameRequest {
    pub source_handle: u64,
    pub buffer: AudioFrameBufferInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureAudioFrameResponse {
    pub async_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureAudioFrameCallback {
    pub async_id: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAudioResamplerRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedAudioResampler {
    pub handle: OwnedHandle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAudioResamplerResponse {
    pub resampler: OwnedAudioResampler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemixAndResampleRequest {
    pub resampler_handle: u64,
    pub buffer: AudioFrameBufferInfo,
    pub num_channels: u32,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemixAndResampleResponse {
    pub buffer: OwnedAudioFrameBuffer,
}
