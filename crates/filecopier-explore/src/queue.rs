//! Thread-safe FIFO of pending directories.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use filecopier_core::CopyError;

/// Errors from queue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Dequeue was attempted with nothing queued.
    #[error("queue is empty")]
    Empty,
}

impl From<QueueError> for CopyError {
    fn from(err: QueueError) -> Self {
        CopyError::internal(err.to_string())
    }
}

/// FIFO queue shared between the scheduler and its tasks.
///
/// Every operation takes the single internal lock, so callers never see a
/// half-applied batch.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> WorkQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Append all `items` at the tail under one lock acquisition.
    pub fn enqueue<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.lock().extend(items);
    }

    /// Append one item at the tail.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
    }

    /// Remove and return the head item.
    pub fn dequeue(&self) -> Result<T, QueueError> {
        self.lock().pop_front().ok_or(QueueError::Empty)
    }

    /// Check whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // A panic while holding the lock cannot leave the deque half-linked,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for WorkQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}
