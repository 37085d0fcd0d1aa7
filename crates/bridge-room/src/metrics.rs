//! Dispatch loop counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Point-in-time view of a room's dispatch counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMetrics {
    /// Engine events taken from the global bus.
    pub events_seen: u64,

    /// Events that targeted this room.
    pub room_events: u64,

    /// Copies delivered to room bus subscribers.
    pub deliveries: u64,

    /// Typed events dropped because a listener channel was full.
    pub listener_drops: u64,

    /// Seconds since the room connected.
    pub uptime_seconds: u64,
}

/// Collects dispatch counters for one room.
#[derive(Debug)]
pub struct DispatchStats {
    start_time: RwLock<Option<Instant>>,
    events_seen: AtomicU64,
    room_events: AtomicU64,
    deliveries: AtomicU64,
    listener_drops: AtomicU64,
}

impl DispatchStats {
    /// Create a new collector with all counters at zero.
    pub fn new() -> Self {
        Self {
            start_time: RwLock::new(None),
            events_seen: AtomicU64::new(0),
            room_events: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            listener_drops: AtomicU64::new(0),
        }
    }

    /// Mark the start of the session for uptime.
    pub fn start(&self) {
        *self.start_time.write() = Some(Instant::now());
    }

    /// Clear the session start.
    pub fn stop(&self) {
        *self.start_time.write() = None;
    }

    /// Count an event taken from the global bus.
    pub fn record_event(&self) {
        self.events_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an event applied to this room.
    pub fn record_room_event(&self) {
        self.room_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Count deliveries to room bus subscribers.
    pub fn record_deliveries(&self, count: usize) {
        self.deliveries.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Count an event dropped for a slow listener.
    pub fn record_listener_drop(&self) {
        self.listener_drops.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> DispatchMetrics {
        let uptime_seconds = self
            .start_time
            .read()
            .map(|s| s.elapsed().as_secs())
            .unwrap_or(0);

        DispatchMetrics {
            events_seen: self.events_seen.load(Ordering::Relaxed),
            room_events: self.room_events.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            listener_drops: self.listener_drops.load(Ordering::Relaxed),
            uptime_seconds,
        }
    }
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self::new()
    }
}
