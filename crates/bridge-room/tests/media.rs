mod support;

use bridge_core::{FfiClient, FfiHandle};
use bridge_media::{
    AudioFrame, AudioSource, AudioStream, MediaError, VideoFrame, VideoFrameBuffer, VideoSource,
    VideoStream,
};
use bridge_proto::{
    AudioFrameBufferInfo, AudioStreamEvent, AudioStreamMessage, FfiEvent, FfiRequest,
    OwnedAudioFrameBuffer, OwnedTrack, OwnedVideoFrameBuffer, RoomEventKind, TrackInfo,
    VideoFrameBufferInfo, VideoFrameBufferType, VideoFrameInfo, VideoRotation, VideoStreamEvent,
    VideoStreamMessage,
};
use bridge_room::{Room, RoomError, RoomEvent, RoomOptions, TrackKind};
use support::{eventually, next_event, remote, FakeEngine};

fn audio_event(engine: &FakeEngine, stream_handle: u64, sample: i16) -> FfiEvent {
    FfiEvent::AudioStreamEvent(AudioStreamEvent {
        stream_handle,
        message: AudioStreamMessage::FrameReceived {
            frame: OwnedAudioFrameBuffer {
                handle: engine.allocate_handle(),
                info: AudioFrameBufferInfo {
                    data: [sample, sample].iter().flat_map(|s| s.to_le_bytes()).collect(),
                    num_channels: 1,
                    sample_rate: 48_000,
                    samples_per_channel: 2,
                },
            },
        },
    })
}

fn audio_eos(stream_handle: u64) -> FfiEvent {
    FfiEvent::AudioStreamEvent(AudioStreamEvent {
        stream_handle,
        message: AudioStreamMessage::Eos,
    })
}

fn first_sample(frame: &AudioFrame) -> i16 {
    frame.samples().next().unwrap()
}

fn track_handle(engine: &FakeEngine, client: &FfiClient) -> FfiHandle {
    client.acquire(engine.allocate_handle().id)
}

#[tokio::test]
async fn test_audio_source_capture() {
    let (engine, client) = FakeEngine::client();
    let source = AudioSource::new(&client, 48_000, 2).unwrap();
    assert_eq!(source.sample_rate(), 48_000);
    assert_eq!(source.num_channels(), 2);

    let frame = AudioFrame::silence(48_000, 2, 480).unwrap();
    source.capture_frame(&frame).await.unwrap();

    let captured = engine
        .requests()
        .into_iter()
        .find_map(|request| match request {
            FfiRequest::CaptureAudioFrame(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(captured.source_handle, source.handle().id());
    assert_eq!(captured.buffer.samples_per_channel, 480);
    assert_eq!(captured.buffer.data.len(), 480 * 2 * 2);
    // The completion wait left no subscription behind.
    assert!(client.events().is_empty());
}

#[tokio::test]
async fn test_audio_source_capture_error() {
    let (engine, client) = FakeEngine::client();
    let source = AudioSource::new(&client, 16_000, 1).unwrap();
    engine.fail_completion("capture_audio_frame", "queue full");

    let frame = AudioFrame::from_samples(&[1, 2, 3], 16_000, 1).unwrap();
    let err = source.capture_frame(&frame).await.unwrap_err();
    assert!(matches!(err, MediaError::CaptureFrame(ref msg) if msg == "queue full"));
}

#[tokio::test]
async fn test_audio_stream_receives_until_eos() {
    let (engine, client) = FakeEngine::client();
    let track = track_handle(&engine, &client);
    let mut stream = AudioStream::new(&client, &track, 0).unwrap();
    let stream_id = stream.handle().id();

    engine.emit(audio_event(&engine, stream_id, 7));
    // Frames of other streams are not ours.
    engine.emit(audio_event(&engine, stream_id + 1000, 99));
    engine.emit(audio_event(&engine, stream_id, 8));
    engine.emit(audio_eos(stream_id));

    let first = stream.recv().await.unwrap();
    assert_eq!(first_sample(&first), 7);
    assert_eq!(first.samples_per_channel(), 2);
    let second = stream.recv().await.unwrap();
    assert_eq!(first_sample(&second), 8);
    assert!(stream.recv().await.is_none());

    // Dropping a received frame releases its engine buffer.
    let buffer = first.handle_id().unwrap();
    drop(first);
    assert!(engine.was_dropped(buffer));

    stream.close().await;
    assert!(engine.was_dropped(stream_id));
}

#[tokio::test]
async fn test_audio_stream_keeps_latest_frames() {
    let (engine, client) = FakeEngine::client();
    let track = track_handle(&engine, &client);
    let mut stream = AudioStream::new(&client, &track, 2).unwrap();
    let stream_id = stream.handle().id();

    for sample in 1..=4 {
        engine.emit(audio_event(&engine, stream_id, sample));
    }
    eventually(|| stream.dropped_frames() == 2).await;

    let kept: Vec<i16> = std::iter::from_fn(|| stream.try_recv())
        .map(|frame| first_sample(&frame))
        .collect();
    assert_eq!(kept, vec![3, 4]);
}

#[tokio::test]
async fn test_audio_stream_close_stops_task() {
    let (engine, client) = FakeEngine::client();
    let track = track_handle(&engine, &client);
    let stream = AudioStream::new(&client, &track, 0).unwrap();
    let stream_id = stream.handle().id();
    assert_eq!(client.events().len(), 1);

    stream.close().await;

    assert!(engine.was_dropped(stream_id));
    assert!(client.events().is_empty());
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let (engine, client) = FakeEngine::client();
    let track = track_handle(&engine, &client);
    let mut stream = AudioStream::new(&client, &track, 0).unwrap();
    let stream_id = stream.handle().id();

    let bad = engine.allocate_handle();
    engine.emit(FfiEvent::AudioStreamEvent(AudioStreamEvent {
        stream_handle: stream_id,
        message: AudioStreamMessage::FrameReceived {
            frame: OwnedAudioFrameBuffer {
                handle: bad,
                info: AudioFrameBufferInfo {
                    data: vec![0; 3],
                    num_channels: 1,
                    sample_rate: 48_000,
                    samples_per_channel: 2,
                },
            },
        },
    }));
    engine.emit(audio_event(&engine, stream_id, 5));

    let frame = stream.recv().await.unwrap();
    assert_eq!(first_sample(&frame), 5);
    assert!(engine.was_dropped(bad.id));
}

#[tokio::test]
async fn test_remix_and_resample() {
    let (engine, client) = FakeEngine::client();
    let frame = AudioFrame::from_samples(&[10, 20, 30, 40], 48_000, 2).unwrap();
    assert_eq!(frame.samples_per_channel(), 2);

    let mono = frame.remix_and_resample(&client, 16_000, 1).unwrap();

    assert_eq!(mono.num_channels(), 1);
    assert_eq!(mono.sample_rate(), 16_000);
    assert_eq!(mono.samples().collect::<Vec<_>>(), vec![10, 30]);
    // Only the output buffer is still held; the resampler was released.
    assert_eq!(client.live_handles(), 1);
    assert_eq!(engine.dropped().len(), 1);
}

#[tokio::test]
async fn test_video_stream_and_source() {
    let (engine, client) = FakeEngine::client();
    let track = track_handle(&engine, &client);
    let mut stream = VideoStream::new(&client, &track, 1).unwrap();
    let stream_id = stream.handle().id();

    engine.emit(FfiEvent::VideoStreamEvent(VideoStreamEvent {
        stream_handle: stream_id,
        message: VideoStreamMessage::FrameReceived {
            frame: VideoFrameInfo {
                timestamp_us: 1_000,
                rotation: VideoRotation::Rotation90,
            },
            buffer: OwnedVideoFrameBuffer {
                handle: engine.allocate_handle(),
                info: VideoFrameBufferInfo {
                    buffer_type: VideoFrameBufferType::Native,
                    width: 640,
                    height: 480,
                    data: Vec::new(),
                },
            },
        },
    }));
    let frame: VideoFrame = stream.recv().await.unwrap();
    assert_eq!(frame.timestamp_us, 1_000);
    assert_eq!(frame.rotation, VideoRotation::Rotation90);
    assert_eq!(frame.buffer.width(), 640);

    let i420: VideoFrameBuffer = frame.buffer.to_i420(&client).unwrap();
    assert_eq!(i420.buffer_type(), VideoFrameBufferType::I420);
    assert_eq!(i420.data().len(), 6);

    let source = VideoSource::new(&client).unwrap();
    source.capture_frame(&frame).unwrap();
    let captured = engine
        .requests()
        .into_iter()
        .find_map(|request| match request {
            FfiRequest::CaptureVideoFrame(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(captured.source_handle, source.handle().id());
    assert_eq!(captured.buffer_handle, frame.buffer.handle().id());
    assert_eq!(captured.frame.timestamp_us, 1_000);

    engine.emit(FfiEvent::VideoStreamEvent(VideoStreamEvent {
        stream_handle: stream_id,
        message: VideoStreamMessage::Eos,
    }));
    assert!(stream.recv().await.is_none());
}

#[tokio::test]
async fn test_remote_track_streams_check_kind() {
    let (engine, client) = FakeEngine::client();
    engine.set_remote_participants(vec![remote(
        "PA_bob",
        "bob",
        &[("TR_bob_audio", TrackKind::Audio)],
    )]);
    let room = Room::new(&client);
    room.connect("wss://example.invalid", "token", RoomOptions::default())
        .await
        .unwrap();
    let rx = room.subscribe();

    engine.room_event(RoomEventKind::TrackSubscribed {
        participant_sid: "PA_bob".into(),
        track: OwnedTrack {
            handle: engine.allocate_handle(),
            info: TrackInfo {
                sid: "TR_bob_audio".into(),
                kind: TrackKind::Audio,
                remote: true,
                ..Default::default()
            },
        },
    });
    let track = match next_event(&rx).await {
        RoomEvent::TrackSubscribed { track, .. } => track,
        other => panic!("unexpected event: {other:?}"),
    };

    let err = track.video_stream(0).unwrap_err();
    assert!(matches!(
        err,
        RoomError::WrongTrackKind {
            expected: TrackKind::Video,
            actual: TrackKind::Audio
        }
    ));

    let mut stream = track.audio_stream(0).unwrap();
    let stream_id = stream.handle().id();
    engine.emit(audio_event(&engine, stream_id, 42));
    let frame = stream.recv().await.unwrap();
    assert_eq!(first_sample(&frame), 42);

    stream.close().await;
    room.disconnect().await.unwrap();
}
