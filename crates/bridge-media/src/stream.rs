//! Decoded frame streams of remote tracks.

use std::fmt;
use std::sync::Arc;

use bridge_core::{EventSubscription, FfiClient, FfiError, FfiHandle, RingQueue};
use bridge_proto::{
    AudioStreamMessage, AudioStreamType, FfiEvent, NewAudioStreamRequest, NewAudioStreamResponse,
    NewVideoStreamRequest, NewVideoStreamResponse, VideoStreamMessage, VideoStreamType,
};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::frame::{AudioFrame, VideoFrame, VideoFrameBuffer};
use crate::MediaResult;

/// What a stream event carries once decoded.
enum StreamItem<F> {
    Frame(MediaResult<F>),
    Eos,
}

type Decode<F> = fn(&FfiClient, &FfiEvent) -> Option<StreamItem<F>>;

/// Stream plumbing shared by audio and video.
///
/// A background task filters the global event bus by stream handle and
/// feeds frames into a ring queue until end-of-stream or close.
struct FrameStream<F> {
    handle: FfiHandle,
    frames: Arc<RingQueue<F>>,
    stop: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl<F: Send + 'static> FrameStream<F> {
    fn open<R>(
        client: &Arc<FfiClient>,
        request: R,
        owned_handle: impl FnOnce(&FfiClient, R::Response) -> FfiHandle,
        capacity: usize,
        decode: Decode<F>,
    ) -> MediaResult<Self>
    where
        R: StreamRequest,
    {
        let runtime = Handle::try_current().map_err(|_| FfiError::NoRuntime)?;

        // Subscribe before the call so no early frame is missed.
        let subscription = client.events().subscribe();
        let response: R::Response = client.request_as(request, R::KIND)?;
        let handle = owned_handle(client, response);
        let stream_id = handle.checked_id()?;

        let frames = Arc::new(RingQueue::new(capacity));
        let stop = Arc::new(Notify::new());
        let task = runtime.spawn(run(
            Arc::clone(client),
            subscription,
            stream_id,
            Arc::clone(&frames),
            Arc::clone(&stop),
            decode,
        ));
        debug!(stream_id, kind = R::KIND, "Opened stream");

        Ok(Self {
            handle,
            frames,
            stop,
            task: Some(task),
        })
    }

    async fn recv(&mut self) -> Option<F> {
        self.frames.get().await.ok()
    }

    async fn close(mut self) {
        self.stop.notify_one();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Stream task failed: {}", e);
            }
        }
        self.handle.release();
    }
}

impl<F> Drop for FrameStream<F> {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.stop.notify_one();
        }
    }
}

/// Requests that open a stream, tied to their response type.
trait StreamRequest: Into<bridge_proto::FfiRequest> {
    type Response: TryFrom<bridge_proto::FfiResponse, Error = bridge_proto::FfiResponse>;
    const KIND: &'static str;
}

impl StreamRequest for NewAudioStreamRequest {
    type Response = NewAudioStreamResponse;
    const KIND: &'static str = "new_audio_stream";
}

impl StreamRequest for NewVideoStreamRequest {
    type Response = NewVideoStreamResponse;
    const KIND: &'static str = "new_video_stream";
}

async fn run<F>(
    client: Arc<FfiClient>,
    subscription: EventSubscription,
    stream_id: u64,
    frames: Arc<RingQueue<F>>,
    stop: Arc<Notify>,
    decode: Decode<F>,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = stop.notified() => {
                debug!(stream_id, "Stream closed by owner");
                break;
            }
            event = subscription.wait_for(|e| e.target_handle() == Some(stream_id)) => event,
        };
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                debug!(stream_id, "Stream subscription ended: {}", e);
                break;
            }
        };

        let item = decode(&client, &event);
        let eos = match item {
            Some(StreamItem::Frame(Ok(frame))) => {
                frames.put(frame);
                false
            }
            Some(StreamItem::Frame(Err(e))) => {
                warn!(stream_id, "Dropping malformed frame: {}", e);
                false
            }
            Some(StreamItem::Eos) => true,
            None => false,
        };
        subscription.task_done();

        if eos {
            debug!(stream_id, "End of stream");
            break;
        }
    }
    frames.close();
}

fn decode_audio(client: &FfiClient, event: &FfiEvent) -> Option<StreamItem<AudioFrame>> {
    let FfiEvent::AudioStreamEvent(event) = event else {
        return None;
    };
    Some(match &event.message {
        AudioStreamMessage::FrameReceived { frame } => {
            StreamItem::Frame(AudioFrame::from_owned(client, frame))
        }
        AudioStreamMessage::Eos => StreamItem::Eos,
    })
}

fn decode_video(client: &FfiClient, event: &FfiEvent) -> Option<StreamItem<VideoFrame>> {
    let FfiEvent::VideoStreamEvent(event) = event else {
        return None;
    };
    Some(match &event.message {
        VideoStreamMessage::FrameReceived { frame, buffer } => StreamItem::Frame(
            VideoFrameBuffer::from_owned(client, buffer)
                .map(|buffer| VideoFrame::new(frame.timestamp_us, frame.rotation, buffer)),
        ),
        VideoStreamMessage::Eos => StreamItem::Eos,
    })
}

/// Decoded audio frames of one track.
///
/// Frames are buffered up to the capacity given at creation; beyond that
/// the oldest frames are dropped. [`recv`](Self::recv) returns `None` after
/// the end of the stream.
pub struct AudioStream {
    inner: FrameStream<AudioFrame>,
}

impl AudioStream {
    /// Open a stream on a track. Must be called within a tokio runtime.
    #[instrument(name = "audio_stream_new", skip(client, track))]
    pub fn new(client: &Arc<FfiClient>, track: &FfiHandle, capacity: usize) -> MediaResult<Self> {
        let request = NewAudioStreamRequest {
            track_handle: track.checked_id()?,
            kind: AudioStreamType::Native,
        };
        let inner = FrameStream::open(
            client,
            request,
            |client, response: NewAudioStreamResponse| {
                FfiHandle::from_owned(client, &response.stream.handle)
            },
            capacity,
            decode_audio,
        )?;
        Ok(Self { inner })
    }

    /// Next frame, or `None` once the stream ended.
    pub async fn recv(&mut self) -> Option<AudioFrame> {
        self.inner.recv().await
    }

    /// Next buffered frame without waiting.
    pub fn try_recv(&mut self) -> Option<AudioFrame> {
        self.inner.frames.try_get()
    }

    /// Frames dropped because the reader fell behind.
    pub fn dropped_frames(&self) -> u64 {
        self.inner.frames.evicted()
    }

    /// Get the engine handle of this stream.
    pub fn handle(&self) -> &FfiHandle {
        &self.inner.handle
    }

    /// Stop receiving, wait for the background task, then release the
    /// stream.
    pub async fn close(self) {
        self.inner.close().await;
    }
}

impl fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioStream")
            .field("handle", &self.inner.handle)
            .field("frames", &*self.inner.frames)
            .finish()
    }
}

/// Decoded video frames of one track.
pub struct VideoStream {
    inner: FrameStream<VideoFrame>,
}

impl VideoStream {
    /// Open a stream on a track. Must be called within a tokio runtime.
    #[instrument(name = "video_stream_new", skip(client, track))]
    pub fn new(client: &Arc<FfiClient>, track: &FfiHandle, capacity: usize) -> MediaResult<Self> {
        let request = NewVideoStreamRequest {
            track_handle: track.checked_id()?,
            kind: VideoStreamType::Native,
        };
        let inner = FrameStream::open(
            client,
            request,
            |client, response: NewVideoStreamResponse| {
                FfiHandle::from_owned(client, &response.stream.handle)
            },
            capacity,
            decode_video,
        )?;
        Ok(Self { inner })
    }

    /// Wait for the next frame. Returns `None` after end-of-stream.
    pub async fn recv(&mut self) -> Option<VideoFrame> {
        self.inner.recv().await
    }

    /// Take the next buffered frame without waiting.
    pub fn try_recv(&mut self) -> Option<VideoFrame> {
        self.inner.frames.try_get()
    }

    /// Get the number of frames dropped because the consumer fell behind.
    pub fn dropped_frames(&self) -> u64 {
        self.inner.frames.evicted()
    }

    /// Get the engine handle of this stream.
    pub fn handle(&self) -> &FfiHandle {
        &self.inner.handle
    }

    /// Stop receiving and release the stream handle.
    pub async fn close(self) {
        self.inner.close().await;
    }
}

impl fmt::Debug for VideoStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoStream")
            .field("handle", &self.inner.handle)
            .field("frames", &*self.inner.frames)
            .finish()
    }
}
