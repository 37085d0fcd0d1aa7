//! Queueing primitives for cooperative event delivery.
//!
//! All queues are single-consumer: one task calls `get`/`wait_for` at a time,
//! while any number of producers, including foreign threads, may `put`.
//! Every suspension point (`get`, `wait_for`, `join`) is cancel-safe: dropping
//! the future loses no items.

mod broadcast;
mod inbox;
mod ring;
mod tracking;

pub use broadcast::{BroadcastQueue, Matched, Subscription};
pub use ring::RingQueue;
pub use tracking::AsyncQueue;

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors returned by queue consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was closed and holds no more items.
    #[error("Queue closed")]
    Closed,

    /// Another consumer is already waiting on this queue.
    #[error("Queue already has a waiting consumer")]
    ConsumerBusy,
}
