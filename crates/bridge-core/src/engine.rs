//! The native call boundary.

use std::sync::Arc;

use crate::FfiResult;

/// Callback invoked by the engine with one encoded event. May run on any
/// thread, at any time.
pub type EventCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Raw answer to a native call.
#[derive(Debug, Clone, Default)]
pub struct NativeResponse {
    /// Encoded response envelope.
    pub data: Vec<u8>,

    /// Handle of the engine buffer backing `data`. Dropped by the client
    /// once the response has been decoded. Zero if nothing needs releasing.
    pub token: u64,
}

/// The foreign engine, seen through its three entry points.
pub trait NativeEngine: Send + Sync + 'static {
    /// Perform one synchronous request.
    fn call(&self, request: &[u8]) -> FfiResult<NativeResponse>;

    /// Release an engine-owned handle. Returns false if the engine refused.
    fn drop_handle(&self, id: u64) -> bool;

    /// Install the callback that receives every engine event.
    fn register_event_callback(&self, callback: EventCallback) -> FfiResult<()>;
}
