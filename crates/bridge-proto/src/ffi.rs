//! Top-level envelopes crossing the native boundary.

use serde::{Deserialize, Serialize};

use crate::audio::*;
use crate::room::*;
use crate::track::*;
use crate::video::*;

/// Declares a tagged envelope enum with one variant per message type,
/// plus `name()`, `From<Message>` and `TryFrom<Envelope>` conversions.
macro_rules! envelope {
    (
        $(#[$meta:meta])*
        pub enum $envelope:ident {
            $( $variant:ident($message:ty) => $name:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $envelope {
            $( $variant($message), )+
        }

        impl $envelope {
            /// Short name of the carried message, for logs and errors.
            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $name, )+
                }
            }
        }

        $(
            impl From<$message> for $envelope {
                fn from(message: $message) -> Self {
                    Self::$variant(message)
                }
            }

            impl TryFrom<$envelope> for $message {
                type Error = $envelope;

                fn try_from(envelope: $envelope) -> Result<Self, $envelope> {
                    match envelope {
                        $envelope::$variant(message) => Ok(message),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

envelope! {
    /// A request sent through the synchronous call primitive.
    pub enum FfiRequest {
        Connect(ConnectRequest) => "connect",
        Disconnect(DisconnectRequest) => "disconnect",
        PublishData(PublishDataRequest) => "publish_data",
        PublishTrack(PublishTrackRequest) => "publish_track",
        UnpublishTrack(UnpublishTrackRequest) => "unpublish_track",
        SetSubscribed(SetSubscribedRequest) => "set_subscribed",
        CreateAudioTrack(CreateAudioTrackRequest) => "create_audio_track",
        CreateVideoTrack(CreateVideoTrackRequest) => "create_video_track",
        NewAudioStream(NewAudioStreamRequest) => "new_audio_stream",
        NewVideoStream(NewVideoStreamRequest) => "new_video_stream",
        NewAudioSource(NewAudioSourceRequest) => "new_audio_source",
        NewVideoSource(NewVideoSourceRequest) => "new_video_source",
        CaptureAudioFrame(CaptureAudioFrameRequest) => "capture_audio_frame",
        CaptureVideoFrame(CaptureVideoFrameRequest) => "capture_video_frame",
        NewAudioResampler(NewAudioResamplerRequest) => "new_audio_resampler",
        RemixAndResample(RemixAndResampleRequest) => "remix_and_resample",
        ToI420(ToI420Request) => "to_i420",
    }
}

envelope! {
    /// The immediate answer to an [`FfiRequest`].
    pub enum FfiResponse {
        Connect(ConnectResponse) => "connect",
        Disconnect(DisconnectResponse) => "disconnect",
        PublishData(PublishDataResponse) => "publish_data",
        PublishTrack(PublishTrackResponse) => "publish_track",
        UnpublishTrack(UnpublishTrackResponse) => "unpublish_track",
        SetSubscribed(SetSubscribedResponse) => "set_subscribed",
        CreateAudioTrack(CreateAudioTrackResponse) => "create_audio_track",
        CreateVideoTrack(CreateVideoTrackResponse) => "create_video_track",
        NewAudioStream(NewAudioStreamResponse) => "new_audio_stream",
        NewVideoStream(NewVideoStreamResponse) => "new_video_stream",
        NewAudioSource(NewAudioSourceResponse) => "new_audio_source",
        NewVideoSource(NewVideoSourceResponse) => "new_video_source",
        CaptureAudioFrame(CaptureAudioFrameResponse) => "capture_audio_frame",
        CaptureVideoFrame(CaptureVideoFrameResponse) => "capture_video_frame",
        NewAudioResampler(NewAudioResamplerResponse) => "new_audio_resampler",
        RemixAndResample(RemixAndResampleResponse) => "remix_and_resample",
        ToI420(ToI420Response) => "to_i420",
    }
}

impl FfiResponse {
    /// Correlation id of the completion event this response promises, if the
    /// request was asynchronous.
    pub fn async_id(&self) -> Option<u64> {
        match self {
            Self::Connect(r) => Some(r.async_id),
            Self::Disconnect(r) => Some(r.async_id),
            Self::PublishData(r) => Some(r.async_id),
            Self::PublishTrack(r) => Some(r.async_id),
            Self::UnpublishTrack(r) => Some(r.async_id),
            Self::CaptureAudioFrame(r) => Some(r.async_id),
            _ => None,
        }
    }
}

envelope! {
    /// An engine-originated event delivered through the callback channel.
    pub enum FfiEvent {
        RoomEvent(RoomEvent) => "room_event",
        Connect(ConnectCallback) => "connect",
        Disconnect(DisconnectCallback) => "disconnect",
        PublishData(PublishDataCallback) => "publish_data",
        PublishTrack(PublishTrackCallback) => "publish_track",
        UnpublishTrack(UnpublishTrackCallback) => "unpublish_track",
        CaptureAudioFrame(CaptureAudioFrameCallback) => "capture_audio_frame",
        AudioStreamEvent(AudioStreamEvent) => "audio_stream_event",
        VideoStreamEvent(VideoStreamEvent) => "video_stream_event",
    }
}

impl FfiEvent {
    /// Correlation id for completion events.
    pub fn async_id(&self) -> Option<u64> {
        match self {
            Self::Connect(e) => Some(e.async_id),
            Self::Disconnect(e) => Some(e.async_id),
            Self::PublishData(e) => Some(e.async_id),
            Self::PublishTrack(e) => Some(e.async_id),
            Self::UnpublishTrack(e) => Some(e.async_id),
            Self::CaptureAudioFrame(e) => Some(e.async_id),
            Self::RoomEvent(_) | Self::AudioStreamEvent(_) | Self::VideoStreamEvent(_) => None,
        }
    }

    /// Long-lived handle (room or stream) a scoped event belongs to.
    pub fn target_handle(&self) -> Option<u64> {
        match self {
            Self::RoomEvent(e) => Some(e.room_handle),
            Self::AudioStreamEvent(e) => Some(e.stream_handle),
            Self::VideoStreamEvent(e) => Some(e.stream_handle),
            _ => None,
        }
    }

    /// Failure reported by a completion event. Empty strings count as success.
    pub fn error(&self) -> Option<&str> {
        let error = match self {
            Self::Connect(e) => e.error.as_deref(),
            Self::PublishData(e) => e.error.as_deref(),
            Self::PublishTrack(e) => e.error.as_deref(),
            Self::UnpublishTrack(e) => e.error.as_deref(),
            Self::CaptureAudioFrame(e) => e.error.as_deref(),
            _ => None,
        };
        error.filter(|message| !message.is_empty())
    }

    /// Returns true if this is the completion for `async_id`.
    pub fn completes(&self, async_id: u64) -> bool {
        self.async_id() == Some(async_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::OwnedHandle;

    #[test]
    fn test_event_correlation_fields() {
        let callback = FfiEvent::PublishData(PublishDataCallback {
            async_id: 7,
            error: None,
        });
        assert_eq!(callback.async_id(), Some(7));
        assert_eq!(callback.target_handle(), None);
        assert!(callback.completes(7));
        assert!(!callback.completes(8));

        let scoped = FfiEvent::AudioStreamEvent(AudioStreamEvent {
            stream_handle: 42,
            message: AudioStreamMessage::Eos,
        });
        assert_eq!(scoped.async_id(), None);
        assert_eq!(scoped.target_handle(), Some(42));
    }

    #[test]
    fn test_empty_error_is_success() {
        let ok = FfiEvent::Connect(ConnectCallback {
            async_id: 1,
            error: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(ok.error(), None);

        let failed = FfiEvent::Connect(ConnectCallback {
            async_id: 1,
            error: Some("invalid token".into()),
            ..Default::default()
        });
        assert_eq!(failed.error(), Some("invalid token"));
    }

    #[test]
    fn test_response_conversion() {
        let response: FfiResponse = CreateAudioTrackResponse {
            track: OwnedTrack {
                handle: OwnedHandle::new(3),
                ..Default::default()
            },
        }
        .into();
        assert_eq!(response.name(), "create_audio_track");
        assert_eq!(response.async_id(), None);

        let wrong = ConnectResponse::try_from(response.clone());
        assert!(wrong.is_err());

        let track = CreateAudioTrackResponse::try_from(response).unwrap();
        assert_eq!(track.track.handle.id, 3);
    }
}
