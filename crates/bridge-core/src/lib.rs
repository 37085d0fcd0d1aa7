//! Handle lifetimes, request channel and event fan-out for the media engine
//! bridge.
//!
//! The native engine exposes one synchronous call and one asynchronous event
//! callback. This crate turns that pair into something async code can use:
//!
//! - [`FfiClient`] performs requests and publishes every callback event on a
//!   global [`EventBus`].
//! - [`FfiHandle`] releases engine-owned resources at most once.
//! - [`RingQueue`], [`AsyncQueue`] and [`BroadcastQueue`] are the queueing
//!   primitives that consumers use to correlate completions and to apply
//!   backpressure to the dispatcher.

mod client;
mod engine;
mod error;
mod handle;
pub mod queue;

use std::sync::Arc;

pub use client::FfiClient;
pub use engine::{EventCallback, NativeEngine, NativeResponse};
pub use error::FfiError;
pub use handle::FfiHandle;
pub use queue::{
    AsyncQueue, BroadcastQueue, Matched, QueueError, QueueResult, RingQueue, Subscription,
};

use bridge_proto::FfiEvent;

/// Handle id the engine never allocates.
pub const INVALID_HANDLE: u64 = 0;

/// Result type for bridge operations.
pub type FfiResult<T> = Result<T, FfiError>;

/// Fan-out bus carrying engine events.
pub type EventBus = BroadcastQueue<Arc<FfiEvent>>;

/// One consumer's view of an [`EventBus`].
pub type EventSubscription = Subscription<Arc<FfiEvent>>;
