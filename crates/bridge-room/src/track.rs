//! Local and remote media tracks.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bridge_core::{FfiClient, FfiHandle};
use bridge_media::{AudioSource, AudioStream, VideoSource, VideoStream};
use bridge_proto::{
    CreateAudioTrackRequest, CreateAudioTrackResponse, CreateVideoTrackRequest,
    CreateVideoTrackResponse, OwnedTrack, StreamState, TrackInfo, TrackKind,
};
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::error::RoomError;
use crate::RoomResult;

/// State shared by local and remote tracks.
pub struct Track {
    handle: FfiHandle,
    info: RwLock<TrackInfo>,
}

impl Track {
    fn from_owned(client: &FfiClient, owned: &OwnedTrack) -> Self {
        Self {
            handle: FfiHandle::from_owned(client, &owned.handle),
            info: RwLock::new(owned.info.clone()),
        }
    }

    /// Get the track sid.
    pub fn sid(&self) -> String {
        self.info.read().sid.clone()
    }

    /// Get the track name.
    pub fn name(&self) -> String {
        self.info.read().name.clone()
    }

    /// Get the track kind.
    pub fn kind(&self) -> TrackKind {
        self.info.read().kind
    }

    /// Get the current stream state.
    pub fn stream_state(&self) -> StreamState {
        self.info.read().stream_state
    }

    /// Returns true if the track is muted.
    pub fn muted(&self) -> bool {
        self.info.read().muted
    }

    /// Copy of the current track information.
    pub fn info(&self) -> TrackInfo {
        self.info.read().clone()
    }

    /// Get the engine handle of this track.
    pub fn handle(&self) -> &FfiHandle {
        &self.handle
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.info.write().muted = muted;
    }

    /// Replace the track information with a fresher copy.
    pub fn update_info(&self, info: TrackInfo) {
        *self.info.write() = info;
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info.read();
        f.debug_struct("Track")
            .field("handle", &self.handle)
            .field("sid", &info.sid)
            .field("kind", &info.kind)
            .field("muted", &info.muted)
            .finish()
    }
}

/// A track produced locally from a media source.
#[derive(Debug)]
pub struct LocalTrack {
    track: Track,
}

impl LocalTrack {
    /// Create an audio track fed by `source`.
    #[instrument(name = "create_audio_track", skip(client, source))]
    pub fn create_audio_track(
        client: &FfiClient,
        name: &str,
        source: &AudioSource,
    ) -> RoomResult<Arc<Self>> {
        let response: CreateAudioTrackResponse = client.request_as(
            CreateAudioTrackRequest {
                name: name.to_string(),
                source_handle: source.handle().checked_id()?,
            },
            "create_audio_track",
        )?;
        let track = Track::from_owned(client, &response.track);
        debug!(handle = track.handle.id(), "Created local audio track");
        Ok(Arc::new(Self { track }))
    }

    /// Create a video track fed by `source`.
    #[instrument(name = "create_video_track", skip(client, source))]
    pub fn create_video_track(
        client: &FfiClient,
        name: &str,
        source: &VideoSource,
    ) -> RoomResult<Arc<Self>> {
        let response: CreateVideoTrackResponse = client.request_as(
            CreateVideoTrackRequest {
                name: name.to_string(),
                source_handle: source.handle().checked_id()?,
            },
            "create_video_track",
        )?;
        let track = Track::from_owned(client, &response.track);
        debug!(handle = track.handle.id(), "Created local video track");
        Ok(Arc::new(Self { track }))
    }
}

impl Deref for LocalTrack {
    type Target = Track;

    fn deref(&self) -> &Track {
        &self.track
    }
}

/// A track received from another participant.
pub struct RemoteTrack {
    track: Track,
    client: Arc<FfiClient>,
}

impl RemoteTrack {
    pub(crate) fn from_owned(client: &Arc<FfiClient>, owned: &OwnedTrack) -> Self {
        Self {
            track: Track::from_owned(client, owned),
            client: Arc::clone(client),
        }
    }

    /// Open a stream of decoded audio frames. Must be called within a
    /// tokio runtime.
    pub fn audio_stream(&self, capacity: usize) -> RoomResult<AudioStream> {
        self.expect_kind(TrackKind::Audio)?;
        Ok(AudioStream::new(&self.client, &self.track.handle, capacity)?)
    }

    /// Open a stream of decoded video frames. Must be called within a
    /// tokio runtime.
    pub fn video_stream(&self, capacity: usize) -> RoomResult<VideoStream> {
        self.expect_kind(TrackKind::Video)?;
        Ok(VideoStream::new(&self.client, &self.track.handle, capacity)?)
    }

    fn expect_kind(&self, expected: TrackKind) -> RoomResult<()> {
        let actual = self.kind();
        if actual != expected {
            return Err(RoomError::WrongTrackKind { expected, actual });
        }
        Ok(())
    }
}

impl Deref for RemoteTrack {
    type Target = Track;

    fn deref(&self) -> &Track {
        &self.track
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemoteTrack").field(&self.track).finish()
    }
}
