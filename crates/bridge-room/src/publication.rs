//! Track publications.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bridge_core::{FfiClient, FfiHandle};
use bridge_proto::{
    EncryptionType, OwnedTrackPublication, SetSubscribedRequest, SetSubscribedResponse,
    TrackKind, TrackPublicationInfo, TrackSource,
};
use parking_lot::RwLock;
use tracing::debug;

use crate::track::{LocalTrack, RemoteTrack, Track};
use crate::RoomResult;

/// A track published by the local participant.
pub type LocalTrackPublication = TrackPublication<LocalTrack>;

/// A track published by a remote participant.
pub type RemoteTrackPublication = TrackPublication<RemoteTrack>;

struct PublicationState<T> {
    info: TrackPublicationInfo,
    track: Option<Arc<T>>,
    subscribed: bool,
}

/// A published track as seen by the room.
///
/// The track itself is attached once it is available: immediately for local
/// publications, on subscription for remote ones.
pub struct TrackPublication<T> {
    handle: FfiHandle,
    client: Arc<FfiClient>,
    state: RwLock<PublicationState<T>>,
}

impl<T> TrackPublication<T> {
    pub(crate) fn from_owned(client: &Arc<FfiClient>, owned: &OwnedTrackPublication) -> Self {
        Self {
            handle: FfiHandle::from_owned(client, &owned.handle),
            client: Arc::clone(client),
            state: RwLock::new(PublicationState {
                info: owned.info.clone(),
                track: None,
                subscribed: false,
            }),
        }
    }

    /// Get the publication sid.
    pub fn sid(&self) -> String {
        self.state.read().info.sid.clone()
    }

    /// Get the track name.
    pub fn name(&self) -> String {
        self.state.read().info.name.clone()
    }

    /// Get the track kind.
    pub fn kind(&self) -> TrackKind {
        self.state.read().info.kind
    }

    /// Get the track source.
    pub fn source(&self) -> TrackSource {
        self.state.read().info.source
    }

    /// Returns true if the track is published with simulcast.
    pub fn simulcasted(&self) -> bool {
        self.state.read().info.simulcasted
    }

    /// Get the video width, zero for audio.
    pub fn width(&self) -> u32 {
        self.state.read().info.width
    }

    /// Get the video height, zero for audio.
    pub fn height(&self) -> u32 {
        self.state.read().info.height
    }

    /// Get the track mime type.
    pub fn mime_type(&self) -> String {
        self.state.read().info.mime_type.clone()
    }

    /// Returns true if the publication is muted.
    pub fn muted(&self) -> bool {
        self.state.read().info.muted
    }

    /// Get the frame encryption in use.
    pub fn encryption_type(&self) -> EncryptionType {
        self.state.read().info.encryption_type
    }

    /// Copy of the current publication information.
    pub fn info(&self) -> TrackPublicationInfo {
        self.state.read().info.clone()
    }

    /// The attached track, if any.
    pub fn track(&self) -> Option<Arc<T>> {
        self.state.read().track.clone()
    }

    /// Get the engine handle of this publication.
    pub fn handle(&self) -> &FfiHandle {
        &self.handle
    }

    pub(crate) fn set_track(&self, track: Option<Arc<T>>) -> Option<Arc<T>> {
        std::mem::replace(&mut self.state.write().track, track)
    }
}

impl<T: Deref<Target = Track>> TrackPublication<T> {
    /// Update the muted flag on the publication and its attached track.
    pub(crate) fn set_muted(&self, muted: bool) {
        let mut state = self.state.write();
        state.info.muted = muted;
        if let Some(track) = &state.track {
            track.set_muted(muted);
        }
    }
}

impl TrackPublication<RemoteTrack> {
    /// Whether the local participant is subscribed to this track.
    pub fn subscribed(&self) -> bool {
        self.state.read().subscribed
    }

    /// Ask the engine to subscribe to or unsubscribe from this track. The
    /// outcome arrives later as a room event.
    pub fn set_subscribed(&self, subscribed: bool) -> RoomResult<()> {
        let _: SetSubscribedResponse = self.client.request_as(
            SetSubscribedRequest {
                subscribe: subscribed,
                publication_handle: self.handle.checked_id()?,
            },
            "set_subscribed",
        )?;
        debug!(sid = %self.sid(), subscribed, "Requested subscription change");
        Ok(())
    }

    /// Attach or detach the subscribed track. Returns the previous one.
    pub(crate) fn attach(&self, track: Option<Arc<RemoteTrack>>) -> Option<Arc<RemoteTrack>> {
        let mut state = self.state.write();
        state.subscribed = track.is_some();
        std::mem::replace(&mut state.track, track)
    }
}

impl<T: fmt::Debug> fmt::Debug for TrackPublication<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("TrackPublication")
            .field("handle", &self.handle)
            .field("sid", &state.info.sid)
            .field("kind", &state.info.kind)
            .field("muted", &state.info.muted)
            .field("track", &state.track)
            .finish()
    }
}
