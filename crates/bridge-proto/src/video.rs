//! Video frame, source and stream messages.

use serde::{Deserialize, Serialize};

use crate::handle::OwnedHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

/// Pixel layout of a video buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFrameBufferType {
    #[default]
    Native,
    I420,
    I420a,
    I422,
    I444,
    I010,
    Nv12,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStreamType {
    #[default]
    Native,
    Webgl,
    Html,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSourceType {
    #[default]
    Native,
}

/// Timing and orientation of one video frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFrameInfo {
    pub timestamp_us: i64,
    pub rotation: VideoRotation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFrameBufferInfo {
    pub buffer_type: VideoFrameBufferType,
    pub width: u32,
    pub height: u32,

    /// Raw plane data; empty for native buffers that never leave the engine.
    pub data: Vec<u8>,
}

/// A video buffer owned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedVideoFrameBuffer {
    pub handle: OwnedHandle,
    pub info: VideoFrameBufferInfo,
}

/// Open a stream of decoded frames from a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideoStreamRequest {
    pub track_handle: u64,
    pub kind: VideoStreamType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedVideoStream {
    pub handle: OwnedHandle,
    pub kind: VideoStreamType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewVideoStreamResponse {
    pub stream: OwnedVideoStream,
}

/// An event scoped to one video stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStreamEvent {
    pub stream_handle: u64,
    pub message: VideoStreamMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStreamMessage {
    FrameReceived {
        frame: VideoFrameInfo,
        buffer: OwnedVideoFrameBuffer,
    },
    Eos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideoSourceRequest {
    pub kind: VideoSourceType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedVideoSource {
    pub handle: OwnedHandle,
    pub kind: VideoSourceType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewVideoSourceResponse {
    pub source: OwnedVideoSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureVideoFrameRequest {
    pub source_handle: u64,
    pub buffer_handle: u64,
    pub frame: VideoFrameInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureVideoFrameResponse {}

/// Convert any buffer into an I420 buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToI420Request {
    pub buffer_handle: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToI420Response {
    pub buffer: OwnedVideoFrameBuffer,
}
