//! Typed room events and the listeners they are delivered to.

use std::sync::Arc;

use bridge_proto::{ConnectionQuality, ConnectionState, DataPacketKind, E2eeState};
use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::warn;

use crate::metrics::DispatchStats;
use crate::participant::{LocalParticipant, ParticipantRef, RemoteParticipant};
use crate::publication::{LocalTrackPublication, RemoteTrackPublication};
use crate::track::{LocalTrack, RemoteTrack};
use crate::EVENT_CHANNEL_CAPACITY;

/// Something that happened in a room, with the affected objects resolved.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    ParticipantConnected {
        participant: Arc<RemoteParticipant>,
    },
    ParticipantDisconnected {
        participant: Arc<RemoteParticipant>,
    },
    LocalTrackPublished {
        publication: Arc<LocalTrackPublication>,
        track: Option<Arc<LocalTrack>>,
    },
    LocalTrackUnpublished {
        publication_sid: String,
        publication: Option<Arc<LocalTrackPublication>>,
    },
    TrackPublished {
        publication: Arc<RemoteTrackPublication>,
        participant: Arc<RemoteParticipant>,
    },
    TrackUnpublished {
        publication: Arc<RemoteTrackPublication>,
        participant: Arc<RemoteParticipant>,
    },
    TrackSubscribed {
        track: Arc<RemoteTrack>,
        publication: Arc<RemoteTrackPublication>,
        participant: Arc<RemoteParticipant>,
    },
    TrackUnsubscribed {
        track: Option<Arc<RemoteTrack>>,
        publication: Arc<RemoteTrackPublication>,
        participant: Arc<RemoteParticipant>,
    },
    TrackSubscriptionFailed {
        participant: Arc<RemoteParticipant>,
        track_sid: String,
        error: String,
    },
    TrackMuted {
        participant: ParticipantRef,
        track_sid: String,
    },
    TrackUnmuted {
        participant: ParticipantRef,
        track_sid: String,
    },
    ActiveSpeakersChanged {
        speakers: Vec<ParticipantRef>,
    },
    ConnectionQualityChanged {
        participant: ParticipantRef,
        quality: ConnectionQuality,
    },
    DataReceived {
        payload: Bytes,
        kind: DataPacketKind,
        participant: Option<Arc<RemoteParticipant>>,
    },
    E2eeStateChanged {
        participant: ParticipantRef,
        state: E2eeState,
    },
    ConnectionStateChanged(ConnectionState),
    Disconnected,
    Reconnecting,
    Reconnected,
    /// The dispatch loop stopped on an error. No further events follow.
    Faulted {
        reason: String,
    },
}

impl RoomEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParticipantConnected { .. } => "participant_connected",
            Self::ParticipantDisconnected { .. } => "participant_disconnected",
            Self::LocalTrackPublished { .. } => "local_track_published",
            Self::LocalTrackUnpublished { .. } => "local_track_unpublished",
            Self::TrackPublished { .. } => "track_published",
            Self::TrackUnpublished { .. } => "track_unpublished",
            Self::TrackSubscribed { .. } => "track_subscribed",
            Self::TrackUnsubscribed { .. } => "track_unsubscribed",
            Self::TrackSubscriptionFailed { .. } => "track_subscription_failed",
            Self::TrackMuted { .. } => "track_muted",
            Self::TrackUnmuted { .. } => "track_unmuted",
            Self::ActiveSpeakersChanged { .. } => "active_speakers_changed",
            Self::ConnectionQualityChanged { .. } => "connection_quality_changed",
            Self::DataReceived { .. } => "data_received",
            Self::E2eeStateChanged { .. } => "e2ee_state_changed",
            Self::ConnectionStateChanged(_) => "connection_state_changed",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
            Self::Reconnected => "reconnected",
            Self::Faulted { .. } => "faulted",
        }
    }
}

/// Listener channels for typed room events.
///
/// Each listener gets a bounded channel. A listener that falls behind loses
/// events rather than stalling the dispatch loop.
#[derive(Debug, Default)]
pub(crate) struct EventListeners {
    senders: Mutex<Vec<Sender<RoomEvent>>>,
}

impl EventListeners {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self) -> Receiver<RoomEvent> {
        let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
        self.senders.lock().push(tx);
        rx
    }

    /// Deliver an event to every listener. Listeners whose receiver was
    /// dropped are forgotten.
    pub(crate) fn emit(&self, event: RoomEvent, stats: &DispatchStats) {
        let mut senders = self.senders.lock();
        senders.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(event = event.name(), "Listener channel full, dropping event");
                stats.record_listener_drop();
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.lock().len()
    }
}

/// The local participant, wrapped for events that can name either kind.
pub(crate) fn local_ref(local: &Arc<LocalParticipant>) -> ParticipantRef {
    ParticipantRef::Local(Arc::clone(local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_every_listener() {
        let listeners = EventListeners::new();
        let stats = DispatchStats::new();
        let a = listeners.subscribe();
        let b = listeners.subscribe();

        listeners.emit(RoomEvent::Reconnecting, &stats);

        assert!(matches!(a.try_recv(), Ok(RoomEvent::Reconnecting)));
        assert!(matches!(b.try_recv(), Ok(RoomEvent::Reconnecting)));
    }

    #[test]
    fn test_full_listener_drops_and_counts() {
        let listeners = EventListeners::new();
        let stats = DispatchStats::new();
        let rx = listeners.subscribe();

        for _ in 0..EVENT_CHANNEL_CAPACITY + 3 {
            listeners.emit(RoomEvent::Reconnected, &stats);
        }

        assert_eq!(rx.len(), EVENT_CHANNEL_CAPACITY);
        assert_eq!(stats.snapshot().listener_drops, 3);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let listeners = EventListeners::new();
        let stats = DispatchStats::new();
        let kept = listeners.subscribe();
        drop(listeners.subscribe());

        listeners.emit(RoomEvent::Disconnected, &stats);

        assert_eq!(listeners.len(), 1);
        assert!(kept.try_recv().is_ok());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            RoomEvent::ConnectionStateChanged(ConnectionState::Connected).name(),
            "connection_state_changed"
        );
        assert_eq!(
            RoomEvent::Faulted {
                reason: "boom".into()
            }
            .name(),
            "faulted"
        );
    }
}
