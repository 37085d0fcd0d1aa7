//! Scripted engine shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bridge_core::{EventCallback, FfiClient, FfiError, FfiResult, NativeEngine, NativeResponse};
use bridge_proto::RoomEvent as EngineRoomEvent;
use bridge_proto::*;
use bridge_room::RoomEvent;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOCAL_SID: &str = "PA_local";
pub const ROOM_SID: &str = "RM_test";

static FIXTURE_HANDLES: AtomicU64 = AtomicU64::new(10_000);

fn fixture_handle() -> OwnedHandle {
    OwnedHandle::new(FIXTURE_HANDLES.fetch_add(1, Ordering::Relaxed))
}

/// Install a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Answers every request with plausible responses and fires completion
/// events from inside the call, like the real engine may.
#[derive(Default)]
pub struct FakeEngine {
    callback: Mutex<Option<EventCallback>>,
    next_handle: AtomicU64,
    next_async_id: AtomicU64,
    room_handle: AtomicU64,
    remote_participants: Mutex<Vec<ParticipantWithTracks>>,
    completion_errors: Mutex<HashMap<&'static str, String>>,
    transport_errors: Mutex<HashMap<&'static str, String>>,
    held: Mutex<HashMap<&'static str, bool>>,
    pending: Mutex<Vec<FfiEvent>>,
    requests: Mutex<Vec<FfiRequest>>,
    dropped: Mutex<Vec<u64>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        let engine = Self::default();
        engine.next_handle.store(100, Ordering::Relaxed);
        engine.next_async_id.store(1000, Ordering::Relaxed);
        Arc::new(engine)
    }

    /// Engine plus a client wired to it.
    pub fn client() -> (Arc<Self>, Arc<FfiClient>) {
        init_tracing();
        let engine = Self::new();
        let client = FfiClient::new(engine.clone()).expect("client");
        (engine, client)
    }

    /// Participants reported by the next connect.
    pub fn set_remote_participants(&self, participants: Vec<ParticipantWithTracks>) {
        *self.remote_participants.lock() = participants;
    }

    /// Complete the next request of `kind` with an error.
    pub fn fail_completion(&self, kind: &'static str, error: &str) {
        self.completion_errors.lock().insert(kind, error.to_string());
    }

    /// Fail the next native call of `kind`.
    pub fn fail_call(&self, kind: &'static str, error: &str) {
        self.transport_errors.lock().insert(kind, error.to_string());
    }

    /// Keep completions of `kind` back until [`release_held`](Self::release_held).
    pub fn hold_completions(&self, kind: &'static str) {
        self.held.lock().insert(kind, true);
    }

    /// Fire every held completion.
    pub fn release_held(&self) {
        let pending: Vec<_> = self.pending.lock().drain(..).collect();
        for event in pending {
            self.emit(event);
        }
    }

    pub fn room_handle(&self) -> u64 {
        self.room_handle.load(Ordering::Relaxed)
    }

    /// Deliver one event through the registered callback.
    pub fn emit(&self, event: FfiEvent) {
        let bytes = JsonCodec.encode("event", &event).expect("encode event");
        self.emit_raw(&bytes);
    }

    pub fn emit_raw(&self, bytes: &[u8]) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(bytes);
        }
    }

    /// Deliver a room event for the connected room.
    pub fn room_event(&self, message: RoomEventKind) {
        self.emit(FfiEvent::RoomEvent(EngineRoomEvent {
            room_handle: self.room_handle(),
            message,
        }));
    }

    pub fn requests(&self) -> Vec<FfiRequest> {
        self.requests.lock().clone()
    }

    pub fn dropped(&self) -> Vec<u64> {
        self.dropped.lock().clone()
    }

    pub fn was_dropped(&self, id: u64) -> bool {
        self.dropped.lock().contains(&id)
    }

    pub fn allocate_handle(&self) -> OwnedHandle {
        OwnedHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    fn async_id(&self) -> u64 {
        self.next_async_id.fetch_add(1, Ordering::Relaxed)
    }

    fn completion_error(&self, kind: &'static str) -> Option<String> {
        self.completion_errors.lock().remove(kind)
    }

    fn respond(&self, request: FfiRequest) -> (FfiResponse, Vec<FfiEvent>) {
        match request {
            FfiRequest::Connect(_) => {
                let async_id = self.async_id();
                let error = self.completion_error("connect");
                let room = self.allocate_handle();
                if error.is_none() {
                    self.room_handle.store(room.id, Ordering::Relaxed);
                }
                let callback = ConnectCallback {
                    async_id,
                    error,
                    room: OwnedRoom {
                        handle: room,
                        info: RoomInfo {
                            sid: ROOM_SID.into(),
                            name: "test-room".into(),
                            metadata: "{}".into(),
                        },
                    },
                    local_participant: OwnedParticipant {
                        handle: self.allocate_handle(),
                        info: ParticipantInfo {
                            sid: LOCAL_SID.into(),
                            name: "Local".into(),
                            identity: "local".into(),
                            metadata: String::new(),
                        },
                    },
                    participants: self.remote_participants.lock().clone(),
                };
                (
                    ConnectResponse { async_id }.into(),
                    vec![FfiEvent::Connect(callback)],
                )
            }
            FfiRequest::Disconnect(_) => {
                let async_id = self.async_id();
                (
                    DisconnectResponse { async_id }.into(),
                    vec![FfiEvent::Disconnect(DisconnectCallback { async_id })],
                )
            }
            FfiRequest::PublishData(_) => {
                let async_id = self.async_id();
                let error = self.completion_error("publish_data");
                (
                    PublishDataResponse { async_id }.into(),
                    vec![FfiEvent::PublishData(PublishDataCallback { async_id, error })],
                )
            }
            FfiRequest::PublishTrack(request) => {
                let async_id = self.async_id();
                let error = self.completion_error("publish_track");
                let publication = OwnedTrackPublication {
                    handle: self.allocate_handle(),
                    info: TrackPublicationInfo {
                        sid: format!("TR_{}", request.track_handle),
                        name: "local-track".into(),
                        kind: TrackKind::Audio,
                        source: request.options.source,
                        ..Default::default()
                    },
                };
                (
                    PublishTrackResponse { async_id }.into(),
                    vec![FfiEvent::PublishTrack(PublishTrackCallback {
                        async_id,
                        error,
                        publication,
                    })],
                )
            }
            FfiRequest::UnpublishTrack(_) => {
                let async_id = self.async_id();
                let error = self.completion_error("unpublish_track");
                (
                    UnpublishTrackResponse { async_id }.into(),
                    vec![FfiEvent::UnpublishTrack(UnpublishTrackCallback {
                        async_id,
                        error,
                    })],
                )
            }
            FfiRequest::SetSubscribed(_) => (SetSubscribedResponse {}.into(), Vec::new()),
            FfiRequest::CreateAudioTrack(request) => (
                CreateAudioTrackResponse {
                    track: self.local_track(request.name, TrackKind::Audio),
                }
                .into(),
                Vec::new(),
            ),
            FfiRequest::CreateVideoTrack(request) => (
                CreateVideoTrackResponse {
                    track: self.local_track(request.name, TrackKind::Video),
                }
                .into(),
                Vec::new(),
            ),
            FfiRequest::NewAudioStream(request) => (
                NewAudioStreamResponse {
                    stream: OwnedAudioStream {
                        handle: self.allocate_handle(),
                        kind: request.kind,
                    },
                }
                .into(),
                Vec::new(),
            ),
            FfiRequest::NewVideoStream(request) => (
                NewVideoStreamResponse {
                    stream: OwnedVideoStream {
                        handle: self.allocate_handle(),
                        kind: request.kind,
                    },
                }
                .into(),
                Vec::new(),
            ),
            FfiRequest::NewAudioSource(request) => (
                NewAudioSourceResponse {
                    source: OwnedAudioSource {
                        handle: self.allocate_handle(),
                        kind: request.kind,
                    },
                }
                .into(),
                Vec::new(),
            ),
            FfiRequest::NewVideoSource(request) => (
                NewVideoSourceResponse {
                    source: OwnedVideoSource {
                        handle: self.allocate_handle(),
                        kind: request.kind,
                    },
                }
                .into(),
                Vec::new(),
            ),
            FfiRequest::CaptureAudioFrame(_) => {
                let async_id = self.async_id();
                let error = self.completion_error("capture_audio_frame");
                (
                    CaptureAudioFrameResponse { async_id }.into(),
                    vec![FfiEvent::CaptureAudioFrame(CaptureAudioFrameCallback {
                        async_id,
                        error,
                    })],
                )
            }
            FfiRequest::CaptureVideoFrame(_) => (CaptureVideoFrameResponse {}.into(), Vec::new()),
            FfiRequest::NewAudioResampler(_) => (
                NewAudioResamplerResponse {
                    resampler: OwnedAudioResampler {
                        handle: self.allocate_handle(),
                    },
                }
                .into(),
                Vec::new(),
            ),
            FfiRequest::RemixAndResample(request) => {
                // Duplicate the first channel into every output channel.
                let input = request.buffer;
                let channels = request.num_channels as usize;
                let frames = input.samples_per_channel as usize;
                let stride = input.num_channels as usize * 2;
                let mut data = Vec::with_capacity(frames * channels * 2);
                for frame in 0..frames {
                    let sample = &input.data[frame * stride..frame * stride + 2];
                    for _ in 0..channels {
                        data.extend_from_slice(sample);
                    }
                }
                (
                    RemixAndResampleResponse {
                        buffer: OwnedAudioFrameBuffer {
                            handle: self.allocate_handle(),
                            info: AudioFrameBufferInfo {
                                data,
                                num_channels: request.num_channels,
                                sample_rate: request.sample_rate,
                                samples_per_channel: input.samples_per_channel,
                            },
                        },
                    }
                    .into(),
                    Vec::new(),
                )
            }
            FfiRequest::ToI420(_) => (
                ToI420Response {
                    buffer: OwnedVideoFrameBuffer {
                        handle: self.allocate_handle(),
                        info: VideoFrameBufferInfo {
                            buffer_type: VideoFrameBufferType::I420,
                            width: 2,
                            height: 2,
                            data: vec![0; 6],
                        },
                    },
                }
                .into(),
                Vec::new(),
            ),
        }
    }

    fn local_track(&self, name: String, kind: TrackKind) -> OwnedTrack {
        let handle = self.allocate_handle();
        OwnedTrack {
            handle,
            info: TrackInfo {
                sid: format!("TR_local_{}", handle.id),
                name,
                kind,
                ..Default::default()
            },
        }
    }
}

impl NativeEngine for FakeEngine {
    fn call(&self, request: &[u8]) -> FfiResult<NativeResponse> {
        let request: FfiRequest = JsonCodec.decode("request", request)?;
        let kind = request.name();
        self.requests.lock().push(request.clone());

        if let Some(error) = self.transport_errors.lock().remove(kind) {
            return Err(FfiError::Transport(error));
        }

        let (response, events) = self.respond(request);
        if self.held.lock().get(kind).copied().unwrap_or(false) {
            self.pending.lock().extend(events);
        } else {
            for event in events {
                self.emit(event);
            }
        }

        Ok(NativeResponse {
            data: JsonCodec.encode("response", &response)?,
            token: 0,
        })
    }

    fn drop_handle(&self, id: u64) -> bool {
        self.dropped.lock().push(id);
        true
    }

    fn register_event_callback(&self, callback: EventCallback) -> FfiResult<()> {
        *self.callback.lock() = Some(callback);
        Ok(())
    }
}

/// A remote participant with the given publications.
pub fn remote(
    sid: &str,
    identity: &str,
    publications: &[(&str, TrackKind)],
) -> ParticipantWithTracks {
    ParticipantWithTracks {
        participant: owned_participant(sid, identity),
        publications: publications
            .iter()
            .map(|(track_sid, kind)| OwnedTrackPublication {
                handle: fixture_handle(),
                info: TrackPublicationInfo {
                    sid: track_sid.to_string(),
                    kind: *kind,
                    remote: true,
                    ..Default::default()
                },
            })
            .collect(),
    }
}

pub fn owned_participant(sid: &str, identity: &str) -> OwnedParticipant {
    OwnedParticipant {
        handle: fixture_handle(),
        info: ParticipantInfo {
            sid: sid.into(),
            name: identity.into(),
            identity: identity.into(),
            metadata: String::new(),
        },
    }
}

/// Next typed event, failing the test after two seconds.
pub async fn next_event(rx: &Receiver<RoomEvent>) -> RoomEvent {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Ok(event) = rx.try_recv() {
            return event;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for a room event"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until `condition` holds, failing the test after two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
