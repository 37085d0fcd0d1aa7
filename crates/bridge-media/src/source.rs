//! Local media sources that frames are pushed into.

use std::sync::Arc;

use bridge_core::{FfiClient, FfiHandle};
use bridge_proto::{
    AudioSourceType, CaptureAudioFrameRequest, CaptureVideoFrameRequest,
    CaptureVideoFrameResponse, NewAudioSourceRequest, NewAudioSourceResponse,
    NewVideoSourceRequest, NewVideoSourceResponse, VideoSourceType,
};
use tracing::{debug, instrument, trace};

use crate::error::MediaError;
use crate::frame::{AudioFrame, VideoFrame};
use crate::MediaResult;

/// Engine-side audio source fed with PCM frames.
#[derive(Debug)]
pub struct AudioSource {
    client: Arc<FfiClient>,
    handle: FfiHandle,
    sample_rate: u32,
    num_channels: u32,
}

impl AudioSource {
    #[instrument(name = "audio_source_new", skip(client))]
    pub fn new(client: &Arc<FfiClient>, sample_rate: u32, num_channels: u32) -> MediaResult<Self> {
        let response: NewAudioSourceResponse = client.request_as(
            NewAudioSourceRequest {
                kind: AudioSourceType::Native,
                sample_rate,
                num_channels,
            },
            "new_audio_source",
        )?;
        let handle = FfiHandle::from_owned(client, &response.source.handle);
        debug!(handle = handle.id(), "Created audio source");

        Ok(Self {
            client: Arc::clone(client),
            handle,
            sample_rate,
            num_channels,
        })
    }

    /// Push one frame and wait until the engine accepted it.
    pub async fn capture_frame(&self, frame: &AudioFrame) -> MediaResult<()> {
        let request = CaptureAudioFrameRequest {
            source_handle: self.handle.checked_id()?,
            buffer: frame.buffer_info(),
        };

        let completion = self
            .client
            .request_async(self.client.events(), request)
            .await?;
        if let Some(error) = completion.error() {
            return Err(MediaError::CaptureFrame(error.to_string()));
        }

        trace!(
            samples = frame.samples_per_channel(),
            "Captured audio frame"
        );
        Ok(())
    }

    /// Get the engine handle of this source.
    pub fn handle(&self) -> &FfiHandle {
        &self.handle
    }

    /// Get the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of channels.
    pub fn num_channels(&self) -> u32 {
        self.num_channels
    }
}

/// Engine-side video source fed with frame buffers.
#[derive(Debug)]
pub struct VideoSource {
    client: Arc<FfiClient>,
    handle: FfiHandle,
}

impl VideoSource {
    #[instrument(name = "video_source_new", skip(client))]
    pub fn new(client: &Arc<FfiClient>) -> MediaResult<Self> {
        let response: NewVideoSourceResponse = client.request_as(
            NewVideoSourceRequest {
                kind: VideoSourceType::Native,
            },
            "new_video_source",
        )?;
        let handle = FfiHandle::from_owned(client, &response.source.handle);
        debug!(handle = handle.id(), "Created video source");

        Ok(Self {
            client: Arc::clone(client),
            handle,
        })
    }

    /// Push one frame. The engine copies the buffer synchronously.
    pub fn capture_frame(&self, frame: &VideoFrame) -> MediaResult<()> {
        let _: CaptureVideoFrameResponse = self.client.request_as(
            CaptureVideoFrameRequest {
                source_handle: self.handle.checked_id()?,
                buffer_handle: frame.buffer.handle().checked_id()?,
                frame: frame.info(),
            },
            "capture_video_frame",
        )?;
        Ok(())
    }

    /// Get the engine handle of this source.
    pub fn handle(&self) -> &FfiHandle {
        &self.handle
    }
}
