//! Typed request, response and event envelopes for the media engine bridge.
//!
//! This crate defines every message exchanged with the native engine, plus
//! the [`Codec`] seam that turns them into the byte payloads carried by the
//! native call boundary. Apart from the correlation accessors on
//! [`FfiEvent`] and [`FfiResponse`], the runtime treats these as opaque.

mod audio;
mod codec;
mod e2ee;
mod error;
mod ffi;
mod handle;
mod participant;
mod room;
mod track;
mod video;

pub use audio::{
    AudioFrameBufferInfo, AudioSourceType, AudioStreamEvent, AudioStreamMessage, AudioStreamType,
    CaptureAudioFrameCallback, CaptureAudioFrameRequest, CaptureAudioFrameResponse,
    NewAudioResamplerRequest, NewAudioResamplerResponse, NewAudioSourceRequest,
    NewAudioSourceResponse, NewAudioStreamRequest, NewAudioStreamResponse, OwnedAudioFrameBuffer,
    OwnedAudioResampler, OwnedAudioSource, OwnedAudioStream, RemixAndResampleRequest,
    RemixAndResampleResponse,
};
pub use codec::{Codec, JsonCodec};
pub use e2ee::{
    E2eeOptions, E2eeState, EncryptionType, KeyProviderOptions, DEFAULT_MAGIC_BYTES,
    DEFAULT_RATCHET_SALT, DEFAULT_RATCHET_WINDOW_SIZE,
};
pub use error::ProtoError;
pub use ffi::{FfiEvent, FfiRequest, FfiResponse};
pub use handle::OwnedHandle;
pub use participant::{OwnedParticipant, ParticipantInfo};
pub use room::{
    ConnectCallback, ConnectRequest, ConnectResponse, ConnectionQuality, ConnectionState,
    DataPacketKind, DisconnectCallback, DisconnectRequest, DisconnectResponse, OwnedBuffer,
    OwnedRoom, ParticipantWithTracks, PublishDataCallback, PublishDataRequest,
    PublishDataResponse, PublishTrackCallback, PublishTrackRequest, PublishTrackResponse,
    RoomEvent, RoomEventKind, RoomInfo, RoomOptions, SetSubscribedRequest, SetSubscribedResponse,
    TrackPublishOptions, UnpublishTrackCallback, UnpublishTrackRequest, UnpublishTrackResponse,
};
pub use track::{
    CreateAudioTrackRequest, CreateAudioTrackResponse, CreateVideoTrackRequest,
    CreateVideoTrackResponse, OwnedTrack, OwnedTrackPublication, StreamState, TrackInfo,
    TrackKind, TrackPublicationInfo, TrackSource, VideoCodec,
};
pub use video::{
    CaptureVideoFrameRequest, CaptureVideoFrameResponse, NewVideoSourceRequest,
    NewVideoSourceResponse, NewVideoStreamRequest, NewVideoStreamResponse, OwnedVideoFrameBuffer,
    OwnedVideoSource, OwnedVideoStream, ToI420Request, ToI420Response, VideoFrameBufferInfo,
    VideoFrameBufferType, VideoFrameInfo, VideoRotation, VideoSourceType, VideoStreamEvent,
    VideoStreamMessage, VideoStreamType,
};

/// Result type for encoding and decoding operations.
pub type ProtoResult<T> = Result<T, ProtoError>;
