//! Bounded "most recent wins" delivery queue.

use std::fmt;

use tracing::trace;

use super::inbox::{Delivery, Inbox};
use super::QueueResult;

/// Single-consumer queue that drops the oldest item when full.
///
/// Meant for high-rate ephemeral data such as media frames, where a stale
/// item is worth less than a fresh one. A capacity of zero disables the
/// bound. When the consumer is already suspended in [`get`](Self::get), a
/// `put` hands the item over directly without buffering it.
///
/// Only one `get` may be pending at a time; a second concurrent call
/// returns [`QueueError::ConsumerBusy`](super::QueueError::ConsumerBusy).
pub struct RingQueue<T> {
    inbox: Inbox<T>,
}

impl<T> RingQueue<T> {
    /// Create a queue holding at most `capacity` items (0 = unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            inbox: Inbox::new(capacity),
        }
    }

    /// Create an unbounded queue.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Enqueue an item, evicting the oldest one if the queue is full.
    /// Items put after [`close`](Self::close) are dropped.
    pub fn put(&self, item: T) {
        match self.inbox.push(item) {
            Delivery::Evicted => {
                trace!(total = self.evicted(), "Ring queue full, evicted oldest item");
            }
            Delivery::Rejected => trace!("Ring queue closed, dropping item"),
            Delivery::HandedOff | Delivery::Buffered => {}
        }
    }

    /// Wait for the next item. Fails with `Closed` once the queue is closed
    /// and drained.
    pub async fn get(&self) -> QueueResult<T> {
        self.inbox.pop().await
    }

    /// Take the next buffered item without waiting.
    pub fn try_get(&self) -> Option<T> {
        self.inbox.try_pop()
    }

    /// Mark the end of the stream. Buffered items can still be drained.
    pub fn close(&self) {
        self.inbox.close();
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.inbox.len()
    }

    /// Returns true if no items are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity (0 = unbounded).
    pub fn capacity(&self) -> usize {
        self.inbox.capacity()
    }

    /// Total number of items evicted to make room, including an item taken
    /// by an abandoned [`get`](Self::get) that no longer fits.
    pub fn evicted(&self) -> u64 {
        self.inbox.evicted()
    }
}

impl<T> Default for RingQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> fmt::Debug for RingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("evicted", &self.evicted())
            .finish()
    }
}
