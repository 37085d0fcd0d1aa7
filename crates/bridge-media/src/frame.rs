//! Audio and video frame types.

use bridge_core::{FfiClient, FfiHandle};
use bridge_proto::{
    AudioFrameBufferInfo, NewAudioResamplerRequest, NewAudioResamplerResponse,
    OwnedAudioFrameBuffer, OwnedVideoFrameBuffer, RemixAndResampleRequest,
    RemixAndResampleResponse, ToI420Request, ToI420Response, VideoFrameBufferInfo,
    VideoFrameBufferType, VideoFrameInfo, VideoRotation,
};
use bytes::Bytes;
use tracing::{instrument, trace};

use crate::error::MediaError;
use crate::{MediaResult, BYTES_PER_SAMPLE};

/// A block of interleaved 16-bit PCM audio.
#[derive(Debug)]
pub struct AudioFrame {
    /// Engine buffer backing the frame, if it came from the engine.
    handle: Option<FfiHandle>,

    /// Little-endian i16 samples, interleaved by channel.
    data: Bytes,

    sample_rate: u32,
    num_channels: u32,
    samples_per_channel: u32,
}

impl AudioFrame {
    /// Create a frame from raw little-endian sample bytes.
    pub fn new(
        data: impl Into<Bytes>,
        sample_rate: u32,
        num_channels: u32,
        samples_per_channel: u32,
    ) -> MediaResult<Self> {
        let data = data.into();
        let expected = Self::buffer_size(num_channels, samples_per_channel);
        if data.len() != expected {
            return Err(MediaError::InvalidFrame(format!(
                "expected {} bytes for {} channels x {} samples, got {}",
                expected,
                num_channels,
                samples_per_channel,
                data.len()
            )));
        }
        if num_channels == 0 || sample_rate == 0 {
            return Err(MediaError::InvalidFrame(
                "sample rate and channel count must be non-zero".into(),
            ));
        }

        Ok(Self {
            handle: None,
            data,
            sample_rate,
            num_channels,
            samples_per_channel,
        })
    }

    /// Create a frame from interleaved samples.
    pub fn from_samples(samples: &[i16], sample_rate: u32, num_channels: u32) -> MediaResult<Self> {
        if num_channels == 0 || samples.len() % num_channels as usize != 0 {
            return Err(MediaError::InvalidFrame(format!(
                "{} samples do not split into {} channels",
                samples.len(),
                num_channels
            )));
        }

        let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let samples_per_channel = (samples.len() / num_channels as usize) as u32;
        Self::new(data, sample_rate, num_channels, samples_per_channel)
    }

    /// Create a frame of silence.
    pub fn silence(
        sample_rate: u32,
        num_channels: u32,
        samples_per_channel: u32,
    ) -> MediaResult<Self> {
        let data = vec![0u8; Self::buffer_size(num_channels, samples_per_channel)];
        Self::new(data, sample_rate, num_channels, samples_per_channel)
    }

    /// Wrap an engine-owned buffer, taking ownership of its handle.
    pub fn from_owned(client: &FfiClient, owned: &OwnedAudioFrameBuffer) -> MediaResult<Self> {
        // Acquired first so the buffer is released even if validation fails.
        let handle = FfiHandle::from_owned(client, &owned.handle);
        let info = &owned.info;
        let mut frame = Self::new(
            info.data.clone(),
            info.sample_rate,
            info.num_channels,
            info.samples_per_channel,
        )?;
        frame.handle = Some(handle);
        Ok(frame)
    }

    /// Expected byte length for a layout.
    pub fn buffer_size(num_channels: u32, samples_per_channel: u32) -> usize {
        num_channels as usize * samples_per_channel as usize * BYTES_PER_SAMPLE
    }

    /// Convert to another sample rate and channel layout using an engine
    /// resampler.
    #[instrument(name = "audio_remix_and_resample", skip(self, client))]
    pub fn remix_and_resample(
        &self,
        client: &FfiClient,
        sample_rate: u32,
        num_channels: u32,
    ) -> MediaResult<AudioFrame> {
        let created: NewAudioResamplerResponse =
            client.request_as(NewAudioResamplerRequest {}, "new_audio_resampler")?;
        let resampler = FfiHandle::from_owned(client, &created.resampler.handle);

        let response: RemixAndResampleResponse = client.request_as(
            RemixAndResampleRequest {
                resampler_handle: resampler.checked_id()?,
                buffer: self.buffer_info(),
                num_channels,
                sample_rate,
            },
            "remix_and_resample",
        )?;
        trace!(
            from_rate = self.sample_rate,
            to_rate = sample_rate,
            "Resampled audio frame"
        );

        AudioFrame::from_owned(client, &response.buffer)
    }

    /// Layout and samples as carried in requests.
    pub fn buffer_info(&self) -> AudioFrameBufferInfo {
        AudioFrameBufferInfo {
            data: self.data.to_vec(),
            num_channels: self.num_channels,
            sample_rate: self.sample_rate,
            samples_per_channel: self.samples_per_channel,
        }
    }

    /// Decoded interleaved samples.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.data
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
    }

    /// Get the raw little-endian sample bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Get the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of interleaved channels.
    pub fn num_channels(&self) -> u32 {
        self.num_channels
    }

    /// Get the number of samples in each channel.
    pub fn samples_per_channel(&self) -> u32 {
        self.samples_per_channel
    }

    /// Engine buffer id, if the frame came from the engine.
    pub fn handle_id(&self) -> Option<u64> {
        self.handle.as_ref().map(FfiHandle::id)
    }
}

/// A video buffer owned by the engine.
#[derive(Debug)]
pub struct VideoFrameBuffer {
    handle: FfiHandle,
    buffer_type: VideoFrameBufferType,
    width: u32,
    height: u32,
    data: Bytes,
}

impl VideoFrameBuffer {
    /// Wrap an engine-owned buffer, taking ownership of its handle.
    pub fn from_owned(client: &FfiClient, owned: &OwnedVideoFrameBuffer) -> MediaResult<Self> {
        let handle = FfiHandle::from_owned(client, &owned.handle);
        let VideoFrameBufferInfo {
            buffer_type,
            width,
            height,
            data,
        } = owned.info.clone();

        let buffer = Self {
            handle,
            buffer_type,
            width,
            height,
            data: Bytes::from(data),
        };
        if !buffer.is_valid() {
            return Err(MediaError::InvalidFrame(format!(
                "{:?} buffer of {}x{} carries {} bytes",
                buffer_type,
                width,
                height,
                buffer.data.len()
            )));
        }
        Ok(buffer)
    }

    /// Expected byte length of a tightly packed buffer, or `None` for
    /// engine-native buffers whose pixels never leave the engine.
    pub fn expected_size(
        buffer_type: VideoFrameBufferType,
        width: u32,
        height: u32,
    ) -> Option<usize> {
        let luma = width as usize * height as usize;
        let chroma_w = (width as usize).div_ceil(2);
        let chroma_h = (height as usize).div_ceil(2);

        match buffer_type {
            VideoFrameBufferType::Native => None,
            VideoFrameBufferType::I420 | VideoFrameBufferType::Nv12 => {
                Some(luma + 2 * chroma_w * chroma_h)
            }
            VideoFrameBufferType::I420a => Some(2 * luma + 2 * chroma_w * chroma_h),
            VideoFrameBufferType::I422 => Some(luma + 2 * chroma_w * height as usize),
            VideoFrameBufferType::I444 => Some(3 * luma),
            // 10-bit samples stored in 16-bit words.
            VideoFrameBufferType::I010 => Some(2 * (luma + 2 * chroma_w * chroma_h)),
        }
    }

    /// Empty data means the pixels stay inside the engine.
    pub fn is_valid(&self) -> bool {
        if self.data.is_empty() {
            return true;
        }
        Self::expected_size(self.buffer_type, self.width, self.height)
            .map_or(true, |expected| expected == self.data.len())
    }

    /// Convert into a new I420 buffer.
    #[instrument(name = "video_to_i420", skip(self, client), fields(from = ?self.buffer_type))]
    pub fn to_i420(&self, client: &FfiClient) -> MediaResult<VideoFrameBuffer> {
        let response: ToI420Response = client.request_as(
            ToI420Request {
                buffer_handle: self.handle.checked_id()?,
            },
            "to_i420",
        )?;
        VideoFrameBuffer::from_owned(client, &response.buffer)
    }

    /// Get the engine handle owning this buffer.
    pub fn handle(&self) -> &FfiHandle {
        &self.handle
    }

    /// Get the pixel layout of this buffer.
    pub fn buffer_type(&self) -> VideoFrameBufferType {
        self.buffer_type
    }

    /// Get the width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the pixel data, empty for native buffers.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// A video buffer plus its timing and orientation.
#[derive(Debug)]
pub struct VideoFrame {
    pub timestamp_us: i64,
    pub rotation: VideoRotation,
    pub buffer: VideoFrameBuffer,
}

impl VideoFrame {
    /// Create a new video frame.
    pub fn new(timestamp_us: i64, rotation: VideoRotation, buffer: VideoFrameBuffer) -> Self {
        Self {
            timestamp_us,
            rotation,
            buffer,
        }
    }

    /// Timing and orientation as carried in requests.
    pub fn info(&self) -> VideoFrameInfo {
        VideoFrameInfo {
            timestamp_us: self.timestamp_us,
            rotation: self.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_frame_length_is_validated() {
        assert!(AudioFrame::new(vec![0u8; 960 * 2 * 2], 48_000, 2, 960).is_ok());

        let err = AudioFrame::new(vec![0u8; 10], 48_000, 2, 960).unwrap_err();
        assert!(matches!(err, MediaError::InvalidFrame(_)));
    }

    #[test]
    fn test_audio_frame_rejects_zero_channels() {
        assert!(AudioFrame::new(Vec::<u8>::new(), 48_000, 0, 0).is_err());
        assert!(AudioFrame::from_samples(&[1, 2, 3], 48_000, 0).is_err());
    }

    #[test]
    fn test_samples_round_trip_interleaving() {
        let frame = AudioFrame::from_samples(&[1, -1, 300, -300], 16_000, 2).unwrap();
        assert_eq!(frame.samples_per_channel(), 2);
        assert_eq!(frame.samples().collect::<Vec<_>>(), vec![1, -1, 300, -300]);
        assert_eq!(frame.handle_id(), None);
    }

    #[test]
    fn test_uneven_channel_split_is_rejected() {
        let err = AudioFrame::from_samples(&[1, 2, 3], 48_000, 2).unwrap_err();
        assert!(matches!(err, MediaError::InvalidFrame(_)));
    }

    #[test]
    fn test_silence_is_zeroed() {
        let frame = AudioFrame::silence(48_000, 1, 480).unwrap();
        assert_eq!(frame.data().len(), 960);
        assert!(frame.samples().all(|s| s == 0));
    }

    #[test]
    fn test_expected_video_sizes() {
        use VideoFrameBufferType::*;

        assert_eq!(VideoFrameBuffer::expected_size(I420, 4, 2), Some(8 + 2 * 2));
        assert_eq!(VideoFrameBuffer::expected_size(Nv12, 3, 3), Some(9 + 2 * 2 * 2));
        assert_eq!(VideoFrameBuffer::expected_size(I444, 2, 2), Some(12));
        assert_eq!(VideoFrameBuffer::expected_size(I010, 2, 2), Some(12));
        assert_eq!(VideoFrameBuffer::expected_size(Native, 1920, 1080), None);
    }
}
