//! Room sessions and their event dispatch loop.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_core::{EventBus, EventSubscription, FfiClient, FfiError, FfiHandle};
use bridge_proto::{
    ConnectRequest, ConnectionState, DisconnectRequest, FfiEvent, RoomEventKind, RoomInfo,
    RoomOptions,
};
use bytes::Bytes;
use crossbeam_channel::Receiver;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::RoomError;
use crate::events::{local_ref, EventListeners, RoomEvent};
use crate::metrics::{DispatchMetrics, DispatchStats};
use crate::participant::{LocalParticipant, ParticipantRef, RemoteParticipant};
use crate::publication::TrackPublication;
use crate::state::SessionState;
use crate::track::RemoteTrack;
use crate::RoomResult;

/// A session in one room.
///
/// After [`connect`](Self::connect), a background task takes every engine
/// event from the client's global bus, applies the ones that target this
/// room to the participant state, then forwards each event to the room bus
/// and waits for the room bus to drain before taking the next one.
pub struct Room {
    inner: Arc<RoomInner>,
}

struct RoomInner {
    client: Arc<FfiClient>,
    state: RwLock<SessionState>,
    connecting: AtomicBool,
    handle: RwLock<Option<FfiHandle>>,
    info: RwLock<RoomInfo>,
    connection_state: RwLock<ConnectionState>,
    local: RwLock<Option<Arc<LocalParticipant>>>,
    participants: RwLock<HashMap<String, Arc<RemoteParticipant>>>,
    room_bus: EventBus,
    listeners: EventListeners,
    metrics: DispatchStats,
    close: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Room {
    /// Create a new room bound to `client`. Nothing is sent until [`connect`](Self::connect).
    pub fn new(client: &Arc<FfiClient>) -> Self {
        Self {
            inner: Arc::new(RoomInner {
                client: Arc::clone(client),
                state: RwLock::new(SessionState::Idle),
                connecting: AtomicBool::new(false),
                handle: RwLock::new(None),
                info: RwLock::new(RoomInfo::default()),
                connection_state: RwLock::new(ConnectionState::Disconnected),
                local: RwLock::new(None),
                participants: RwLock::new(HashMap::new()),
                room_bus: EventBus::new(),
                listeners: EventListeners::new(),
                metrics: DispatchStats::new(),
                close: Notify::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// Join a room and start the dispatch loop. Must be called within a
    /// tokio runtime. A room connects at most once; a failed attempt may be
    /// retried.
    #[instrument(name = "room_connect", skip(self, token, options))]
    pub async fn connect(&self, url: &str, token: &str, options: RoomOptions) -> RoomResult<()> {
        if !self.inner.state.read().is_idle() || self.inner.connecting.swap(true, Ordering::AcqRel)
        {
            return Err(RoomError::AlreadyConnected);
        }

        let result = self.establish(url, token, options).await;
        if result.is_err() {
            self.inner.connecting.store(false, Ordering::Release);
        }
        result
    }

    async fn establish(&self, url: &str, token: &str, options: RoomOptions) -> RoomResult<()> {
        let runtime = Handle::try_current().map_err(|_| FfiError::NoRuntime)?;
        let inner = &self.inner;
        let client = &inner.client;

        // Subscribe before the request so no event for this room is missed.
        let dispatch = client.events().subscribe();

        let request = ConnectRequest {
            url: url.to_string(),
            token: token.to_string(),
            options,
        };
        let completion = client.request_async(client.events(), request).await?;
        let callback = match &**completion {
            FfiEvent::Connect(callback) => callback,
            other => return Err(RoomError::UnexpectedEvent(other.name())),
        };
        if let Some(error) = completion.error() {
            return Err(RoomError::Connect(error.to_string()));
        }

        let handle = FfiHandle::from_owned(client, &callback.room.handle);
        let room_id = handle.checked_id()?;
        let local = Arc::new(LocalParticipant::new(
            client,
            &callback.local_participant,
            inner.room_bus.clone(),
        ));

        let mut participants = HashMap::new();
        for entry in &callback.participants {
            let participant = Arc::new(RemoteParticipant::from_owned(client, &entry.participant));
            for owned in &entry.publications {
                participant.insert_track(Arc::new(TrackPublication::from_owned(client, owned)));
            }
            let sid = participant.sid().to_string();
            if participants.insert(sid.clone(), participant).is_some() {
                return Err(RoomError::ParticipantExists(sid));
            }
        }

        *inner.info.write() = callback.room.info.clone();
        *inner.handle.write() = Some(handle);
        *inner.local.write() = Some(local);
        *inner.participants.write() = participants;
        *inner.connection_state.write() = ConnectionState::Connected;
        drop(completion);

        *inner.state.write() = SessionState::Connected;
        inner.metrics.start();
        let task = runtime.spawn(dispatch_loop(Arc::clone(inner), dispatch, room_id));
        *inner.task.lock() = Some(task);

        info!(
            room_id,
            sid = %inner.info.read().sid,
            participants = inner.participants.read().len(),
            "Connected to room"
        );
        Ok(())
    }

    /// Leave the room and wait for the dispatch loop to stop.
    ///
    /// Does nothing unless connected. After a fault it only releases the
    /// room handle.
    #[instrument(name = "room_disconnect", skip(self))]
    pub async fn disconnect(&self) -> RoomResult<()> {
        let inner = &self.inner;
        {
            let mut state = inner.state.write();
            if state.is_faulted() {
                drop(state);
                inner.release_handle();
                return Ok(());
            }
            if !state.is_connected() {
                return Ok(());
            }
            *state = SessionState::Draining;
        }

        let room_handle = inner.handle.read().as_ref().map(FfiHandle::checked_id);
        let result = match room_handle {
            Some(Ok(room_handle)) => inner
                .client
                .request_async(inner.client.events(), DisconnectRequest { room_handle })
                .await
                .map(drop),
            Some(Err(e)) => Err(e),
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!("Disconnect request failed: {}", e);
        }

        inner.close.notify_one();
        let task = inner.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Dispatch task failed: {}", e);
            }
        }

        {
            let mut state = inner.state.write();
            if state.is_draining() {
                *state = SessionState::Closed;
            }
        }
        *inner.connection_state.write() = ConnectionState::Disconnected;
        inner.room_bus.close();
        inner.release_handle();
        inner.metrics.stop();
        info!("Disconnected from room");

        result.map_err(RoomError::from)
    }

    /// True while the session is running and the engine reports a live
    /// connection.
    pub fn is_connected(&self) -> bool {
        self.inner.state.read().is_connected()
            && *self.inner.connection_state.read() != ConnectionState::Disconnected
    }

    /// Get the room sid.
    pub fn sid(&self) -> String {
        self.inner.info.read().sid.clone()
    }

    /// Get the room name.
    pub fn name(&self) -> String {
        self.inner.info.read().name.clone()
    }

    /// Get the room metadata.
    pub fn metadata(&self) -> String {
        self.inner.info.read().metadata.clone()
    }

    /// Get the last connection state reported by the engine.
    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.connection_state.read()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.inner.state.read().clone()
    }

    /// The local participant, once connected.
    pub fn local_participant(&self) -> Option<Arc<LocalParticipant>> {
        self.inner.local.read().clone()
    }

    /// Get a remote participant by sid.
    pub fn remote_participant(&self, sid: &str) -> Option<Arc<RemoteParticipant>> {
        self.inner.participants.read().get(sid).cloned()
    }

    /// Snapshot of the remote participants, keyed by sid.
    pub fn remote_participants(&self) -> HashMap<String, Arc<RemoteParticipant>> {
        self.inner.participants.read().clone()
    }

    /// Receive typed room events. The channel holds
    /// [`EVENT_CHANNEL_CAPACITY`](crate::EVENT_CHANNEL_CAPACITY) events;
    /// a listener that falls behind misses events.
    pub fn subscribe(&self) -> Receiver<RoomEvent> {
        self.inner.listeners.subscribe()
    }

    /// Raw engine events forwarded by the dispatch loop.
    ///
    /// The loop waits for every subscriber to mark each event done before
    /// taking the next one, so subscribers must keep consuming.
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.room_bus
    }

    /// Get a snapshot of the dispatch counters.
    pub fn metrics(&self) -> DispatchMetrics {
        self.inner.metrics.snapshot()
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        // Local participants may outlive the room; their waits must fail.
        self.inner.room_bus.close();
        if self.inner.task.lock().is_some() {
            self.inner.close.notify_one();
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("state", &*self.inner.state.read())
            .field("handle", &*self.inner.handle.read())
            .field("sid", &self.inner.info.read().sid)
            .field("connection_state", &*self.inner.connection_state.read())
            .field("participants", &self.inner.participants.read().len())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

/// Forward engine events until close is requested or routing fails.
async fn dispatch_loop(inner: Arc<RoomInner>, subscription: EventSubscription, room_id: u64) {
    debug!(room_id, "Dispatch loop started");

    let outcome = loop {
        let event = tokio::select! {
            biased;
            _ = inner.close.notified() => break Ok(()),
            event = subscription.get() => event,
        };
        let event = match event {
            Ok(event) => event,
            Err(e) => break Err(format!("global event bus failed: {}", e)),
        };
        inner.metrics.record_event();

        if let FfiEvent::RoomEvent(room_event) = &*event {
            if room_event.room_handle == room_id {
                inner.metrics.record_room_event();
                if let Err(e) = inner.handle_room_event(&room_event.message) {
                    subscription.task_done();
                    break Err(e.to_string());
                }
            }
        }

        let delivered = inner.room_bus.publish(event);
        inner.metrics.record_deliveries(delivered);

        // Hold the next event back until every room subscriber is done.
        let closed = tokio::select! {
            biased;
            _ = inner.close.notified() => true,
            _ = inner.room_bus.join() => false,
        };
        subscription.task_done();
        if closed {
            break Ok(());
        }
    };

    match outcome {
        Ok(()) => {
            inner.room_bus.close();
            debug!(room_id, "Dispatch loop stopped");
        }
        Err(reason) => inner.fault(reason),
    }
}

impl RoomInner {
    /// Stop delivering and fail every pending wait on the room bus.
    fn fault(&self, reason: String) {
        error!("Room dispatch failed: {}", reason);
        self.room_bus.close();
        {
            let mut state = self.state.write();
            if state.is_terminal() {
                return;
            }
            *state = SessionState::Faulted {
                reason: reason.clone(),
            };
        }
        *self.connection_state.write() = ConnectionState::Disconnected;
        self.metrics.stop();
        self.emit(RoomEvent::Faulted { reason });
    }

    fn release_handle(&self) {
        if let Some(handle) = self.handle.write().take() {
            handle.release();
        }
    }

    fn emit(&self, event: RoomEvent) {
        self.listeners.emit(event, &self.metrics);
    }

    fn local(&self) -> RoomResult<Arc<LocalParticipant>> {
        self.local.read().clone().ok_or(RoomError::NotConnected)
    }

    fn remote(&self, sid: &str) -> RoomResult<Arc<RemoteParticipant>> {
        self.participants
            .read()
            .get(sid)
            .cloned()
            .ok_or_else(|| RoomError::UnknownParticipant(sid.to_string()))
    }

    /// Either participant kind by sid.
    fn participant(&self, sid: &str) -> RoomResult<ParticipantRef> {
        if let Some(local) = self.local.read().as_ref() {
            if local.sid() == sid {
                return Ok(local_ref(local));
            }
        }
        self.remote(sid).map(ParticipantRef::Remote)
    }

    fn set_muted(
        &self,
        participant_sid: &str,
        track_sid: &str,
        muted: bool,
    ) -> RoomResult<ParticipantRef> {
        let participant = self.participant(participant_sid)?;
        let found = match &participant {
            ParticipantRef::Local(p) => p.track(track_sid).map(|pb| pb.set_muted(muted)),
            ParticipantRef::Remote(p) => p.track(track_sid).map(|pb| pb.set_muted(muted)),
        };
        found.ok_or_else(|| RoomError::UnknownPublication(track_sid.to_string()))?;
        Ok(participant)
    }

    /// Apply one room event to the participant state and notify listeners.
    fn handle_room_event(&self, kind: &RoomEventKind) -> RoomResult<()> {
        let event = match kind {
            RoomEventKind::ParticipantConnected { info } => {
                let participant = Arc::new(RemoteParticipant::from_owned(&self.client, info));
                let sid = participant.sid().to_string();
                {
                    let mut participants = self.participants.write();
                    if participants.contains_key(&sid) {
                        return Err(RoomError::ParticipantExists(sid));
                    }
                    participants.insert(sid.clone(), Arc::clone(&participant));
                }
                info!(sid = %sid, identity = %participant.identity(), "Participant connected");
                RoomEvent::ParticipantConnected { participant }
            }
            RoomEventKind::ParticipantDisconnected { participant_sid } => {
                let participant = self
                    .participants
                    .write()
                    .remove(participant_sid)
                    .ok_or_else(|| RoomError::UnknownParticipant(participant_sid.clone()))?;
                info!(sid = %participant_sid, "Participant disconnected");
                RoomEvent::ParticipantDisconnected { participant }
            }
            RoomEventKind::LocalTrackPublished { track_sid } => {
                let publication = self
                    .local()?
                    .track(track_sid)
                    .ok_or_else(|| RoomError::UnknownPublication(track_sid.clone()))?;
                let track = publication.track();
                RoomEvent::LocalTrackPublished { publication, track }
            }
            RoomEventKind::LocalTrackUnpublished { publication_sid } => {
                RoomEvent::LocalTrackUnpublished {
                    publication: self.local()?.track(publication_sid),
                    publication_sid: publication_sid.clone(),
                }
            }
            RoomEventKind::TrackPublished {
                participant_sid,
                publication,
            } => {
                let participant = self.remote(participant_sid)?;
                let publication = Arc::new(TrackPublication::from_owned(&self.client, publication));
                participant.insert_track(Arc::clone(&publication));
                RoomEvent::TrackPublished {
                    publication,
                    participant,
                }
            }
            RoomEventKind::TrackUnpublished {
                participant_sid,
                publication_sid,
            } => {
                let participant = self.remote(participant_sid)?;
                let publication = participant
                    .remove_track(publication_sid)
                    .ok_or_else(|| RoomError::UnknownPublication(publication_sid.clone()))?;
                RoomEvent::TrackUnpublished {
                    publication,
                    participant,
                }
            }
            RoomEventKind::TrackSubscribed {
                participant_sid,
                track,
            } => {
                let participant = self.remote(participant_sid)?;
                let publication = participant
                    .track(&track.info.sid)
                    .ok_or_else(|| RoomError::UnknownPublication(track.info.sid.clone()))?;
                let track = Arc::new(RemoteTrack::from_owned(&self.client, track));
                publication.attach(Some(Arc::clone(&track)));
                debug!(sid = %track.sid(), kind = ?track.kind(), "Subscribed to track");
                RoomEvent::TrackSubscribed {
                    track,
                    publication,
                    participant,
                }
            }
            RoomEventKind::TrackUnsubscribed {
                participant_sid,
                track_sid,
            } => {
                let participant = self.remote(participant_sid)?;
                let publication = participant
                    .track(track_sid)
                    .ok_or_else(|| RoomError::UnknownPublication(track_sid.clone()))?;
                let track = publication.attach(None);
                RoomEvent::TrackUnsubscribed {
                    track,
                    publication,
                    participant,
                }
            }
            RoomEventKind::TrackSubscriptionFailed {
                participant_sid,
                track_sid,
                error,
            } => {
                warn!(track_sid = %track_sid, "Track subscription failed: {}", error);
                RoomEvent::TrackSubscriptionFailed {
                    participant: self.remote(participant_sid)?,
                    track_sid: track_sid.clone(),
                    error: error.clone(),
                }
            }
            RoomEventKind::TrackMuted {
                participant_sid,
                track_sid,
            } => RoomEvent::TrackMuted {
                participant: self.set_muted(participant_sid, track_sid, true)?,
                track_sid: track_sid.clone(),
            },
            RoomEventKind::TrackUnmuted {
                participant_sid,
                track_sid,
            } => RoomEvent::TrackUnmuted {
                participant: self.set_muted(participant_sid, track_sid, false)?,
                track_sid: track_sid.clone(),
            },
            RoomEventKind::ActiveSpeakersChanged { participant_sids } => {
                let speakers = participant_sids
                    .iter()
                    .filter_map(|sid| match self.participant(sid) {
                        Ok(participant) => Some(participant),
                        Err(e) => {
                            warn!("Skipping active speaker: {}", e);
                            None
                        }
                    })
                    .collect();
                RoomEvent::ActiveSpeakersChanged { speakers }
            }
            RoomEventKind::ConnectionQualityChanged {
                participant_sid,
                quality,
            } => RoomEvent::ConnectionQualityChanged {
                participant: self.participant(participant_sid)?,
                quality: *quality,
            },
            RoomEventKind::DataReceived {
                data,
                participant_sid,
                kind,
            } => {
                let payload = Bytes::copy_from_slice(&data.data);
                FfiHandle::from_owned(&self.client, &data.handle).release();
                let participant = participant_sid
                    .as_deref()
                    .and_then(|sid| self.participants.read().get(sid).cloned());
                RoomEvent::DataReceived {
                    payload,
                    kind: *kind,
                    participant,
                }
            }
            RoomEventKind::E2eeStateChanged {
                participant_sid,
                state,
            } => RoomEvent::E2eeStateChanged {
                participant: self.participant(participant_sid)?,
                state: *state,
            },
            RoomEventKind::ConnectionStateChanged { state } => {
                *self.connection_state.write() = *state;
                info!(state = ?state, "Connection state changed");
                RoomEvent::ConnectionStateChanged(*state)
            }
            RoomEventKind::Disconnected => RoomEvent::Disconnected,
            RoomEventKind::Reconnecting => RoomEvent::Reconnecting,
            RoomEventKind::Reconnected => RoomEvent::Reconnected,
        };

        self.emit(event);
        Ok(())
    }
}
