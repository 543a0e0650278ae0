//! Hand-off point between the ingress (many producers) and the worker (one
//! consumer).

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use refire_core::TransactionId;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;

/// A transaction waiting for the worker, stamped with its arrival time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// The transaction to trigger.
    pub id: TransactionId,
    /// When the entry was accepted.
    pub enqueued_at: Instant,
}

impl QueueEntry {
    /// Stamp `id` with the current time.
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            enqueued_at: Instant::now(),
        }
    }
}

/// Reasons an enqueue is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnqueueError {
    /// A bounded queue is at capacity. The new entry is rejected; queued
    /// entries are never evicted to make room.
    #[error("queue is full ({capacity} pending)")]
    Full { capacity: usize },

    /// The worker has stopped and the queue no longer accepts entries.
    #[error("queue is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Inner {
    entries: VecDeque<QueueEntry>,
    closed: bool,
}

/// FIFO queue of accepted transactions.
///
/// Enqueue is synchronous and never waits: it takes a short internal lock,
/// appends, and wakes the consumer. [`dequeue`](Self::dequeue) suspends
/// until an entry is available. Entries come out in arrival order; the
/// cooldown is applied by the worker, not by the queue.
///
/// # Thread safety
///
/// The internal lock is a standard `Mutex` that is never held across an
/// `.await` point.
#[derive(Debug)]
pub struct DelayQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    capacity: Option<usize>,
}

impl DelayQueue {
    /// Create an unbounded queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use refire_executor::DelayQueue;
    ///
    /// let queue = DelayQueue::unbounded();
    /// assert!(queue.is_empty());
    /// assert_eq!(queue.capacity(), None);
    /// ```
    pub fn unbounded() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
            capacity: None,
        }
    }

    /// Create a queue that rejects entries beyond `capacity`.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::unbounded()
        }
    }

    /// Create a queue from an optional capacity.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        capacity.map_or_else(Self::unbounded, Self::bounded)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves `Inner` consistent, so a poisoned
        // lock is still safe to use.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept a transaction. Returns the queue depth after insertion.
    pub fn enqueue(&self, id: TransactionId) -> Result<usize, EnqueueError> {
        let depth = {
            let mut inner = self.lock();
            if inner.closed {
                return Err(EnqueueError::Closed);
            }
            if let Some(capacity) = self.capacity
                && inner.entries.len() >= capacity
            {
                return Err(EnqueueError::Full { capacity });
            }
            inner.entries.push_back(QueueEntry::new(id));
            inner.entries.len()
        };
        self.notify.notify_one();
        Ok(depth)
    }

    /// Take the oldest entry, waiting for one if the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained. Cancel-safe: an
    /// entry is only removed in the same poll that returns it.
    pub async fn dequeue(&self) -> Option<QueueEntry> {
        loop {
            {
                let mut inner = self.lock();
                if let Some(entry) = inner.entries.pop_front() {
                    return Some(entry);
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Number of entries waiting.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of waiting entries, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Stop accepting entries and discard the ones still waiting.
    ///
    /// Returns the number of discarded entries. Waiting consumers are woken
    /// and see `None`.
    pub fn close(&self) -> usize {
        let dropped = {
            let mut inner = self.lock();
            inner.closed = true;
            let dropped = inner.entries.len();
            inner.entries.clear();
            dropped
        };
        self.notify.notify_waiters();
        self.notify.notify_one();
        dropped
    }
}

impl Default for DelayQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}
