//! Message queues shared between the caller and the supervisor thread.
//!
//! Each direction has its own queue behind its own mutex, so the two
//! threads never contend on a lock spanning both. Inbound (device to
//! caller) is bounded with a drop-newest policy; outbound (caller to
//! device) is unbounded — the caller is trusted not to flood it before a
//! connection exists.
//!
//! Lock poisoning is recovered with `into_inner`: a single push or pop
//! cannot leave the deque in an inconsistent state.

use portlink_core::{Event, Payload};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Bounded FIFO of events flowing from the device to the caller.
///
/// When full, newly arriving events are discarded and the queued ones are
/// preserved — backpressure protects the oldest data, since a caller that
/// stopped polling is most interested in what it missed first.
pub(crate) struct InboundQueue {
    queue: Mutex<VecDeque<Event>>,
    capacity: usize,
}

impl InboundQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event. Returns `false` if the queue was full and the
    /// event was discarded.
    pub(crate) fn push(&self, event: Event) -> bool {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            return false;
        }
        queue.push_back(event);
        true
    }

    /// Remove and return the oldest event, if any.
    pub(crate) fn pop(&self) -> Option<Event> {
        self.lock().pop_front()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Unbounded FIFO of payloads flowing from the caller to the device.
pub(crate) struct OutboundQueue {
    queue: Mutex<VecDeque<Payload>>,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, payload: Payload) {
        self.lock().push_back(payload);
    }

    /// Remove and return the oldest payload, if any.
    pub(crate) fn pop(&self) -> Option<Payload> {
        self.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Discard all pending payloads, returning how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let mut queue = self.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Payload>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State shared between the caller handle and the supervisor thread: the
/// two queues and the stop flag. Nothing else crosses the thread boundary.
pub(crate) struct Shared {
    pub(crate) inbound: InboundQueue,
    pub(crate) outbound: OutboundQueue,
    stop: AtomicBool,
}

impl Shared {
    pub(crate) fn new(max_unread: usize) -> Self {
        Self {
            inbound: InboundQueue::new(max_unread),
            outbound: OutboundQueue::new(),
            stop: AtomicBool::new(false),
        }
    }

    /// Signal the supervisor to stop. Monotonic: never reset.
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}
