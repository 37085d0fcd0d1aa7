//! Byte encoding of envelopes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProtoError;
use crate::ffi::{FfiEvent, FfiRequest, FfiResponse};
use crate::ProtoResult;

/// Turns envelopes into the byte payloads carried by the native boundary.
///
/// The runtime only ever needs the client side of the exchange: requests go
/// out, responses and events come back.
pub trait Codec: Send + Sync + 'static {
    /// Encode a request for the native call.
    fn encode_request(&self, request: &FfiRequest) -> ProtoResult<Vec<u8>>;

    /// Decode the immediate response to a native call.
    fn decode_response(&self, bytes: &[u8]) -> ProtoResult<FfiResponse>;

    /// Decode an event delivered through the callback channel.
    fn decode_event(&self, bytes: &[u8]) -> ProtoResult<FfiEvent>;
}

/// JSON codec backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Encode any serializable message.
    pub fn encode<T: Serialize>(&self, kind: &'static str, message: &T) -> ProtoResult<Vec<u8>> {
        serde_json::to_vec(message).map_err(|e| ProtoError::Encode {
            kind,
            message: e.to_string(),
        })
    }

    /// Decode any deserializable message.
    pub fn decode<T: DeserializeOwned>(&self, kind: &'static str, bytes: &[u8]) -> ProtoResult<T> {
        serde_json::from_slice(bytes).map_err(|e| ProtoError::Decode {
            kind,
            message: e.to_string(),
        })
    }
}

impl Codec for JsonCodec {
    fn encode_request(&self, request: &FfiRequest) -> ProtoResult<Vec<u8>> {
        self.encode("request", request)
    }

    fn decode_response(&self, bytes: &[u8]) -> ProtoResult<FfiResponse> {
        self.decode("response", bytes)
    }

    fn decode_event(&self, bytes: &[u8]) -> ProtoResult<FfiEvent> {
        self.decode("event", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{ConnectionState, RoomEvent, RoomEventKind};

    #[test]
    fn test_decode_room_event() {
        let bytes = br#"{"room_event":{"room_handle":5,"message":{"connection_state_changed":{"state":"reconnecting"}}}}"#;
        let event = JsonCodec.decode_event(bytes).unwrap();

        match event {
            FfiEvent::RoomEvent(RoomEvent {
                room_handle,
                message: RoomEventKind::ConnectionStateChanged { state },
            }) => {
                assert_eq!(room_handle, 5);
                assert_eq!(state, ConnectionState::Reconnecting);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unit_variant() {
        let bytes = br#"{"room_event":{"room_handle":1,"message":"disconnected"}}"#;
        let event = JsonCodec.decode_event(bytes).unwrap();
        assert_eq!(event.target_handle(), Some(1));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = JsonCodec.decode_response(b"not json").unwrap_err();
        assert!(matches!(err, ProtoError::Decode { kind: "response", .. }));
    }
}
