//! Local and remote participants.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bridge_core::{EventBus, FfiClient, FfiHandle};
use bridge_proto::{
    DataPacketKind, FfiEvent, OwnedParticipant, ParticipantInfo, PublishDataRequest,
    PublishTrackRequest, TrackPublishOptions, UnpublishTrackRequest,
};
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::RoomError;
use crate::publication::{LocalTrackPublication, TrackPublication};
use crate::track::{LocalTrack, RemoteTrack};
use crate::RoomResult;

/// A remote member of the room.
pub type RemoteParticipant = Participant<RemoteTrack>;

/// A member of the room and the tracks it published, keyed by sid.
pub struct Participant<T> {
    handle: FfiHandle,
    info: ParticipantInfo,
    tracks: RwLock<HashMap<String, Arc<TrackPublication<T>>>>,
}

impl<T> Participant<T> {
    pub(crate) fn from_owned(client: &FfiClient, owned: &OwnedParticipant) -> Self {
        Self {
            handle: FfiHandle::from_owned(client, &owned.handle),
            info: owned.info.clone(),
            tracks: RwLock::new(HashMap::new()),
        }
    }

    /// Get the server-assigned participant sid.
    pub fn sid(&self) -> &str {
        &self.info.sid
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Get the participant identity.
    pub fn identity(&self) -> &str {
        &self.info.identity
    }

    /// Get the participant metadata.
    pub fn metadata(&self) -> &str {
        &self.info.metadata
    }

    /// Get the full participant info.
    pub fn info(&self) -> &ParticipantInfo {
        &self.info
    }

    /// Get the engine handle of this participant.
    pub fn handle(&self) -> &FfiHandle {
        &self.handle
    }

    /// Publication with the given sid.
    pub fn track(&self, sid: &str) -> Option<Arc<TrackPublication<T>>> {
        self.tracks.read().get(sid).cloned()
    }

    /// Snapshot of every publication.
    pub fn tracks(&self) -> HashMap<String, Arc<TrackPublication<T>>> {
        self.tracks.read().clone()
    }

    pub(crate) fn insert_track(&self, publication: Arc<TrackPublication<T>>) {
        let sid = publication.sid();
        self.tracks.write().insert(sid, publication);
    }

    pub(crate) fn remove_track(&self, sid: &str) -> Option<Arc<TrackPublication<T>>> {
        self.tracks.write().remove(sid)
    }
}

impl<T> fmt::Debug for Participant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("handle", &self.handle)
            .field("sid", &self.info.sid)
            .field("identity", &self.info.identity)
            .field("tracks", &self.tracks.read().len())
            .finish()
    }
}

/// The participant representing this client.
///
/// Its operations wait for their completion on the room bus, so they only
/// work while the room's dispatch loop is running.
pub struct LocalParticipant {
    participant: Participant<LocalTrack>,
    client: Arc<FfiClient>,
    room_bus: EventBus,
}

impl LocalParticipant {
    pub(crate) fn new(
        client: &Arc<FfiClient>,
        owned: &OwnedParticipant,
        room_bus: EventBus,
    ) -> Self {
        Self {
            participant: Participant::from_owned(client, owned),
            client: Arc::clone(client),
            room_bus,
        }
    }

    /// Send a data packet to the room, or only to `destination_sids` when
    /// not empty.
    #[instrument(name = "publish_data", skip(self, payload, destination_sids))]
    pub async fn publish_data(
        &self,
        payload: impl Into<Bytes>,
        kind: DataPacketKind,
        destination_sids: &[String],
    ) -> RoomResult<()> {
        self.ensure_connected()?;
        let request = PublishDataRequest {
            local_participant_handle: self.handle().checked_id()?,
            data: payload.into().to_vec(),
            kind,
            destination_sids: destination_sids.to_vec(),
        };

        let completion = self.client.request_async(&self.room_bus, request).await?;
        if let Some(error) = completion.error() {
            return Err(RoomError::PublishData(error.to_string()));
        }
        Ok(())
    }

    /// Publish a local track and wait for the resulting publication.
    ///
    /// The publication is registered before the dispatch loop moves on, so
    /// the matching local-track-published event can resolve it.
    #[instrument(name = "publish_track", skip_all, fields(track = %track.sid()))]
    pub async fn publish_track(
        &self,
        track: Arc<LocalTrack>,
        options: TrackPublishOptions,
    ) -> RoomResult<Arc<LocalTrackPublication>> {
        self.ensure_connected()?;
        let request = PublishTrackRequest {
            local_participant_handle: self.handle().checked_id()?,
            track_handle: track.handle().checked_id()?,
            options,
        };

        let completion = self.client.request_async(&self.room_bus, request).await?;
        let callback = match &**completion {
            FfiEvent::PublishTrack(callback) => callback,
            other => return Err(RoomError::UnexpectedEvent(other.name())),
        };
        if let Some(error) = completion.error() {
            return Err(RoomError::PublishTrack(error.to_string()));
        }

        let publication = Arc::new(TrackPublication::from_owned(
            &self.client,
            &callback.publication,
        ));
        publication.set_track(Some(track));
        self.participant.insert_track(Arc::clone(&publication));
        info!(sid = %publication.sid(), "Published track");

        // Completion acknowledged only now that the publication is visible.
        drop(completion);
        Ok(publication)
    }

    /// Unpublish the track with the given sid.
    #[instrument(name = "unpublish_track", skip(self))]
    pub async fn unpublish_track(&self, track_sid: &str) -> RoomResult<()> {
        self.ensure_connected()?;
        let request = UnpublishTrackRequest {
            local_participant_handle: self.handle().checked_id()?,
            track_sid: track_sid.to_string(),
            stop_on_unpublish: true,
        };

        let completion = self.client.request_async(&self.room_bus, request).await?;
        if let Some(error) = completion.error() {
            return Err(RoomError::UnpublishTrack(error.to_string()));
        }

        match self.participant.remove_track(track_sid) {
            Some(publication) => {
                publication.set_track(None);
                debug!("Unpublished track");
            }
            None => warn!("Unpublished a track that was not registered"),
        }
        Ok(())
    }

    fn ensure_connected(&self) -> RoomResult<()> {
        if self.room_bus.is_closed() {
            return Err(RoomError::NotConnected);
        }
        Ok(())
    }
}

impl Deref for LocalParticipant {
    type Target = Participant<LocalTrack>;

    fn deref(&self) -> &Self::Target {
        &self.participant
    }
}

impl fmt::Debug for LocalParticipant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalParticipant")
            .field(&self.participant)
            .finish()
    }
}

/// Either kind of participant, as referenced by room events.
#[derive(Debug, Clone)]
pub enum ParticipantRef {
    Local(Arc<LocalParticipant>),
    Remote(Arc<RemoteParticipant>),
}

impl ParticipantRef {
    /// Get the participant sid.
    pub fn sid(&self) -> &str {
        match self {
            Self::Local(p) => p.sid(),
            Self::Remote(p) => p.sid(),
        }
    }

    /// Get the participant identity.
    pub fn identity(&self) -> &str {
        match self {
            Self::Local(p) => p.identity(),
            Self::Remote(p) => p.identity(),
        }
    }

    /// Returns true for the local participant.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}
