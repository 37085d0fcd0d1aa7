//! Fan-out of every published item to every live subscriber.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::tracking::AsyncQueue;
use super::QueueResult;

struct BusState<T> {
    subscribers: Vec<Arc<AsyncQueue<T>>>,
    closed: bool,
}

struct BusShared<T> {
    state: Mutex<BusState<T>>,
}

impl<T> BusShared<T> {
    fn remove(&self, queue: &Arc<AsyncQueue<T>>) -> bool {
        let mut state = self.state.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|q| !Arc::ptr_eq(q, queue));
        before != state.subscribers.len()
    }
}

/// Delivers a copy of each published item to every current subscriber.
///
/// Each subscriber owns an [`AsyncQueue`], so [`join`](Self::join) can wait
/// until every subscriber acknowledged everything published so far. Cloning
/// the bus yields another handle to the same subscriber set.
pub struct BroadcastQueue<T> {
    shared: Arc<BusShared<T>>,
}

impl<T: Clone> BroadcastQueue<T> {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(BusShared {
                state: Mutex::new(BusState {
                    subscribers: Vec::new(),
                    closed: false,
                }),
            }),
        }
    }

    /// Register a new subscriber. It only sees items published after this
    /// call. Subscribing to a closed bus yields an already closed queue.
    pub fn subscribe(&self) -> Subscription<T> {
        let queue = Arc::new(AsyncQueue::new());
        let mut state = self.shared.state.lock();
        if state.closed {
            queue.close();
        } else {
            state.subscribers.push(Arc::clone(&queue));
        }
        trace!(subscribers = state.subscribers.len(), "Subscribed to bus");

        Subscription {
            queue,
            bus: Arc::downgrade(&self.shared),
        }
    }

    /// Remove a subscriber. Its queue is closed, which counts its pending
    /// items as done so it no longer holds back [`join`](Self::join).
    pub fn unsubscribe(&self, subscription: &Subscription<T>) {
        self.shared.remove(&subscription.queue);
        subscription.queue.close();
    }

    /// Put a copy of `item` into every subscriber queue. Returns the number
    /// of subscribers reached; with none, the item is dropped.
    pub fn publish(&self, item: T) -> usize {
        let subscribers = self.snapshot();
        match subscribers.split_last() {
            None => {
                trace!("Published with no subscribers, dropping item");
                0
            }
            Some((last, rest)) => {
                for queue in rest {
                    queue.put(item.clone());
                }
                last.put(item);
                subscribers.len()
            }
        }
    }

    /// Wait until every current subscriber acknowledged all of its items.
    pub async fn join(&self) {
        for queue in self.snapshot() {
            queue.join().await;
        }
    }

    /// Close the bus and every subscriber queue. Later subscriptions are
    /// closed from the start and later publishes reach nobody.
    pub fn close(&self) {
        let subscribers = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            std::mem::take(&mut state.subscribers)
        };
        debug!(subscribers = subscribers.len(), "Closing bus");
        for queue in subscribers {
            queue.close();
        }
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.shared.state.lock().subscribers.len()
    }

    /// Returns true if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    fn snapshot(&self) -> Vec<Arc<AsyncQueue<T>>> {
        self.shared.state.lock().subscribers.clone()
    }
}

impl<T: Clone> Default for BroadcastQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BroadcastQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for BroadcastQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("BroadcastQueue")
            .field("subscribers", &state.subscribers.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// One subscriber's view of a [`BroadcastQueue`].
///
/// Dereferences to the subscriber's [`AsyncQueue`]. Dropping the
/// subscription unsubscribes it.
pub struct Subscription<T> {
    queue: Arc<AsyncQueue<T>>,
    bus: Weak<BusShared<T>>,
}

impl<T> Subscription<T> {
    /// Wait for the first item matching `pred` and keep the subscription
    /// alive alongside it. The returned guard acknowledges the item when
    /// dropped.
    pub async fn into_match<F>(self, pred: F) -> QueueResult<Matched<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let item = self.queue.wait_for(pred).await?;
        Ok(Matched {
            item,
            subscription: self,
        })
    }
}

impl<T> Deref for Subscription<T> {
    type Target = AsyncQueue<T>;

    fn deref(&self) -> &Self::Target {
        &self.queue
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(&self.queue);
        }
        self.queue.close();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("queue", &*self.queue)
            .finish()
    }
}

/// An item taken from a subscription but not yet acknowledged.
///
/// Holding it keeps the publisher's `join` waiting, so the holder can finish
/// reacting to the item before the next one is published. Dropping it calls
/// `task_done` and unsubscribes.
pub struct Matched<T> {
    item: T,
    subscription: Subscription<T>,
}

impl<T> Matched<T> {
    /// Get the matched item.
    pub fn item(&self) -> &T {
        &self.item
    }
}

impl<T> Deref for Matched<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> Drop for Matched<T> {
    fn drop(&mut self) {
        self.subscription.task_done();
    }
}

impl<T: fmt::Debug> fmt::Debug for Matched<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matched").field("item", &self.item).finish()
    }
}
