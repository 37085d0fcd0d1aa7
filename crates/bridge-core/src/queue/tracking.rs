//! Unbounded queue with per-item completion tracking.

use std::fmt;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{trace, warn};

use super::inbox::{Delivery, Inbox};
use super::QueueResult;

/// Single-consumer queue that counts items which were put but not yet
/// marked done.
///
/// Each consumed item must be acknowledged with [`task_done`](Self::task_done).
/// [`join`](Self::join) resolves once every item ever put has been
/// acknowledged, which lets a producer wait until its consumers caught up.
pub struct AsyncQueue<T> {
    inbox: Inbox<T>,
    unfinished: Mutex<usize>,
    processed: Notify,
}

impl<T> AsyncQueue<T> {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self {
            inbox: Inbox::new(0),
            unfinished: Mutex::new(0),
            processed: Notify::new(),
        }
    }

    /// Enqueue an item and count it as unfinished. Items put after
    /// [`close`](Self::close) are dropped and never counted.
    pub fn put(&self, item: T) {
        let mut unfinished = self.unfinished.lock();
        *unfinished += 1;
        if self.inbox.push(item) == Delivery::Rejected {
            *unfinished -= 1;
            trace!("Tracking queue closed, dropping item");
        }
    }

    /// Wait for the next item. The caller owes one `task_done` for it.
    pub async fn get(&self) -> QueueResult<T> {
        self.inbox.pop().await
    }

    /// Take the next buffered item without waiting.
    pub fn get_no_wait(&self) -> Option<T> {
        self.inbox.try_pop()
    }

    /// Wait for the first item satisfying `pred`.
    ///
    /// Items that do not match are acknowledged and discarded on the way.
    /// The matching item is returned still unfinished.
    pub async fn wait_for<F>(&self, mut pred: F) -> QueueResult<T>
    where
        F: FnMut(&T) -> bool,
    {
        loop {
            let item = self.get().await?;
            if pred(&item) {
                return Ok(item);
            }
            self.task_done();
        }
    }

    /// Acknowledge one consumed item.
    ///
    /// Calling this with nothing outstanding is a no-op, which happens when
    /// the queue was closed while a consumer still held an item.
    pub fn task_done(&self) {
        let mut unfinished = self.unfinished.lock();
        match *unfinished {
            0 => {
                if self.inbox.is_closed() {
                    trace!("task_done on closed queue ignored");
                } else {
                    warn!("task_done called more times than items were put");
                }
            }
            1 => {
                *unfinished = 0;
                self.processed.notify_waiters();
            }
            _ => *unfinished -= 1,
        }
    }

    /// Wait until every item put so far has been acknowledged.
    pub async fn join(&self) {
        loop {
            let notified = self.processed.notified();
            if *self.unfinished.lock() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Close the queue: drop buffered items, count everything as done and
    /// fail any waiting consumer.
    pub fn close(&self) {
        let mut unfinished = self.unfinished.lock();
        self.inbox.close();
        let dropped = self.inbox.clear();
        if dropped > 0 {
            trace!(dropped, "Tracking queue closed with pending items");
        }
        *unfinished = 0;
        self.processed.notify_waiters();
    }

    /// Number of items not yet acknowledged.
    pub fn unfinished(&self) -> usize {
        *self.unfinished.lock()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.inbox.len()
    }

    /// Returns true if no items are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }
}

impl<T> Default for AsyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AsyncQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncQueue")
            .field("len", &self.len())
            .field("unfinished", &self.unfinished())
            .field("closed", &self.is_closed())
            .finish()
    }
}
