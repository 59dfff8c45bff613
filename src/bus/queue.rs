//! Bounded drop-oldest event queue.
//!
//! Producers call [`EventBus::enqueue`] from any thread without ever
//! blocking. A single consumer drains the queue through the [`EventStream`]
//! returned by [`EventBus::consume`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use crate::core::DEFAULT_EVENT_CAPACITY;
use crate::message::Event;

#[derive(Debug)]
struct Shared {
    queue: Mutex<VecDeque<Event>>,
    capacity: usize,
    notify: Notify,
    dropped: AtomicU64,
    overflowing: AtomicBool,
    closed: AtomicBool,
    consumer_taken: AtomicBool,
}

/// Multi-producer, single-consumer event queue with a drop-oldest policy.
///
/// Cloning yields another producer handle onto the same queue.
#[derive(Debug, Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus holding at most `capacity` events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY))),
                capacity,
                notify: Notify::new(),
                dropped: AtomicU64::new(0),
                overflowing: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                consumer_taken: AtomicBool::new(false),
            }),
        }
    }

    /// Queue an event. Never blocks.
    ///
    /// When the queue is full the oldest queued event is discarded. Events
    /// enqueued after [`close`](Self::close) are ignored.
    pub fn enqueue(&self, event: Event) {
        if self.shared.closed.load(Ordering::Acquire) {
            return;
        }

        let evicted = {
            let mut queue = self.shared.queue.lock();
            let evicted = if queue.len() >= self.shared.capacity {
                queue.pop_front()
            } else {
                None
            };
            queue.push_back(event);
            evicted
        };

        if let Some(old) = evicted {
            let total = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if !self.shared.overflowing.swap(true, Ordering::Relaxed) {
                debug!(
                    capacity = self.shared.capacity,
                    dropped_total = total,
                    oldest = %old.id(),
                    "event bus full, dropping oldest events"
                );
            }
        }

        self.shared.notify.notify_one();
    }

    /// Take the consuming end of the bus.
    ///
    /// The bus has exactly one consumer for its whole lifetime; later calls
    /// return `None`.
    pub fn consume(&self) -> Option<EventStream> {
        if self.shared.consumer_taken.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(EventStream {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Stop accepting events. The consumer still drains what is queued.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.notify.notify_one();
    }

    /// Check if the bus was closed.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Check if no events are queued.
    pub fn is_empty(&self) -> bool {
        self.shared.queue.lock().is_empty()
    }

    /// Maximum number of queued events.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Total events discarded by the drop-oldest policy.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

/// Consuming end of an [`EventBus`].
#[derive(Debug)]
pub struct EventStream {
    shared: Arc<Shared>,
}

impl EventStream {
    /// Wait for the next event.
    ///
    /// Returns `None` once the bus is closed and drained. Cancel safe: an
    /// event is only removed from the queue when this returns it.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.try_recv() {
                return Some(event);
            }
            if self.shared.closed.load(Ordering::Acquire) {
                return None;
            }
            self.shared.notify.notified().await;
        }
    }

    /// Take the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        let mut queue = self.shared.queue.lock();
        let event = queue.pop_front();
        if event.is_some() && queue.len() < self.shared.capacity {
            self.shared.overflowing.store(false, Ordering::Relaxed);
        }
        event
    }
}
