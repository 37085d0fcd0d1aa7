//! Request channel into the native engine.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_proto::{Codec, FfiEvent, FfiRequest, FfiResponse, JsonCodec};
use tracing::{error, instrument, trace};

use crate::engine::NativeEngine;
use crate::handle::FfiHandle;
use crate::queue::Matched;
use crate::{EventBus, FfiError, FfiResult, INVALID_HANDLE};

/// Entry point to the engine.
///
/// Owns the engine and the codec, performs synchronous requests and
/// publishes every callback event on a global [`EventBus`]. Construct one
/// per process and share it through an `Arc`.
pub struct FfiClient {
    engine: Arc<dyn NativeEngine>,
    codec: Arc<dyn Codec>,
    events: EventBus,
    live: Arc<AtomicUsize>,
}

impl FfiClient {
    /// Create a client using the JSON codec.
    pub fn new(engine: Arc<dyn NativeEngine>) -> FfiResult<Arc<Self>> {
        Self::with_codec(engine, Arc::new(JsonCodec))
    }

    /// Create a client and install the event callback on the engine.
    pub fn with_codec(
        engine: Arc<dyn NativeEngine>,
        codec: Arc<dyn Codec>,
    ) -> FfiResult<Arc<Self>> {
        let events = EventBus::new();

        let callback = {
            let codec = Arc::clone(&codec);
            let events = events.clone();
            Arc::new(move |bytes: &[u8]| match codec.decode_event(bytes) {
                Ok(event) => {
                    let name = event.name();
                    let delivered = events.publish(Arc::new(event));
                    trace!(event = name, delivered, "Dispatched engine event");
                }
                Err(e) => error!("Dropping undecodable engine event: {}", e),
            })
        };
        engine.register_event_callback(callback)?;

        Ok(Arc::new(Self {
            engine,
            codec,
            events,
            live: Arc::new(AtomicUsize::new(0)),
        }))
    }

    /// Global bus carrying every decoded engine event.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Perform one synchronous request.
    ///
    /// Transport failures are returned as-is and never retried.
    #[instrument(name = "ffi_request", skip_all, fields(kind = request.name()))]
    pub fn request(&self, request: FfiRequest) -> FfiResult<FfiResponse> {
        let bytes = self.codec.encode_request(&request)?;
        let raw = self.engine.call(&bytes)?;

        let response = self.codec.decode_response(&raw.data);
        if raw.token != INVALID_HANDLE && !self.engine.drop_handle(raw.token) {
            error!(token = raw.token, "Engine failed to drop response buffer");
        }
        response.map_err(FfiError::from)
    }

    /// Perform a request and unwrap the expected response type.
    pub fn request_as<R>(
        &self,
        request: impl Into<FfiRequest>,
        expected: &'static str,
    ) -> FfiResult<R>
    where
        R: TryFrom<FfiResponse, Error = FfiResponse>,
    {
        let response = self.request(request.into())?;
        R::try_from(response).map_err(|other| FfiError::UnexpectedResponse {
            expected,
            actual: other.name(),
        })
    }

    /// Perform an asynchronous request and wait for its completion event on
    /// `bus`.
    ///
    /// The subscription is taken before the call so a completion that fires
    /// during the call is not missed. The returned guard holds back the bus
    /// barrier until dropped.
    pub async fn request_async(
        &self,
        bus: &EventBus,
        request: impl Into<FfiRequest>,
    ) -> FfiResult<Matched<Arc<FfiEvent>>> {
        let request = request.into();
        let kind = request.name();
        let subscription = bus.subscribe();

        let response = self.request(request)?;
        let async_id = response.async_id().ok_or(FfiError::MissingAsyncId(kind))?;
        trace!(kind, async_id, "Waiting for completion");

        let matched = subscription
            .into_match(move |event| event.completes(async_id))
            .await?;
        Ok(matched)
    }

    /// Take ownership of a handle id.
    pub fn acquire(&self, id: u64) -> FfiHandle {
        FfiHandle::new(Arc::clone(&self.engine), Arc::clone(&self.live), id)
    }

    /// Number of acquired handles not yet released.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for FfiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfiClient")
            .field("events", &self.events)
            .field("live_handles", &self.live_handles())
            .finish()
    }
}
