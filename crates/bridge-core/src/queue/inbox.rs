//! Buffer plus single-waiter hand-off shared by the queue types.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::{QueueError, QueueResult};

/// How a pushed item was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Handed straight to a suspended consumer.
    HandedOff,

    /// Appended to the buffer.
    Buffered,

    /// Appended after evicting the oldest buffered item.
    Evicted,

    /// Dropped because the inbox is closed.
    Rejected,
}

struct InboxState<T> {
    buffer: VecDeque<T>,
    waiter: Option<oneshot::Sender<T>>,
    closed: bool,
}

/// FIFO buffer with an optional capacity and at most one suspended consumer.
pub(crate) struct Inbox<T> {
    state: Mutex<InboxState<T>>,
    capacity: usize,
    evicted: AtomicU64,
}

impl<T> Inbox<T> {
    /// Create an inbox. A capacity of zero means unbounded.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(InboxState {
                buffer: VecDeque::new(),
                waiter: None,
                closed: false,
            }),
            capacity,
            evicted: AtomicU64::new(0),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Deliver an item to the waiting consumer, or buffer it.
    pub(crate) fn push(&self, item: T) -> Delivery {
        let mut state = self.state.lock();
        if state.closed {
            return Delivery::Rejected;
        }

        let item = match state.waiter.take() {
            Some(waiter) => match waiter.send(item) {
                Ok(()) => return Delivery::HandedOff,
                // The waiting consumer went away.
                Err(item) => item,
            },
            None => item,
        };

        let mut delivery = Delivery::Buffered;
        if self.capacity > 0 && state.buffer.len() >= self.capacity {
            state.buffer.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
            delivery = Delivery::Evicted;
        }
        state.buffer.push_back(item);
        delivery
    }

    /// Take the next item, suspending until one arrives.
    pub(crate) async fn pop(&self) -> QueueResult<T> {
        let receiver = {
            let mut state = self.state.lock();
            if let Some(item) = state.buffer.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.waiter.as_ref().is_some_and(|w| !w.is_closed()) {
                return Err(QueueError::ConsumerBusy);
            }

            let (sender, receiver) = oneshot::channel();
            state.waiter = Some(sender);
            receiver
        };

        let mut pending = PendingPop {
            inbox: self,
            receiver,
        };
        (&mut pending.receiver)
            .await
            .map_err(|_| QueueError::Closed)
    }

    /// Take the next buffered item without waiting.
    pub(crate) fn try_pop(&self) -> Option<T> {
        self.state.lock().buffer.pop_front()
    }

    /// Refuse further items and fail the waiting consumer, if any. Buffered
    /// items stay available.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.waiter = None;
    }

    /// Discard every buffered item, returning how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.buffer.len();
        state.buffer.clear();
        dropped
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Items dropped to keep the buffer within capacity.
    pub(crate) fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Put back an item a consumer took but never used. It is older than
    /// anything buffered, so a full buffer drops it instead.
    fn restore(&self, item: T) {
        let mut state = self.state.lock();
        if self.capacity > 0 && state.buffer.len() >= self.capacity {
            drop(state);
            self.evicted.fetch_add(1, Ordering::Relaxed);
            return;
        }
        state.buffer.push_front(item);
    }
}

/// A suspended `pop`. If it is abandoned after an item was handed over, the
/// item goes back to the front of the buffer unless the buffer is full.
struct PendingPop<'a, T> {
    inbox: &'a Inbox<T>,
    receiver: oneshot::Receiver<T>,
}

impl<T> Drop for PendingPop<'_, T> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Ok(item) = self.receiver.try_recv() {
            self.inbox.restore(item);
        }
    }
}
