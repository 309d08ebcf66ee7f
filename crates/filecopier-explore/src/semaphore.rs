//! Counting admission gate for directory tasks.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use filecopier_core::CopyError;

/// Limits how many directory tasks run at once.
///
/// The permit count is fixed at construction. Waiters are served in FIFO
/// order, which is what tokio's semaphore provides.
#[derive(Debug, Clone)]
pub struct WorkerSemaphore {
    inner: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. The slot is returned when this is dropped.
#[derive(Debug)]
#[must_use = "dropping a permit releases it immediately"]
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
}

impl WorkerPermit {
    /// Return the slot to the semaphore.
    pub fn release(self) {}
}

impl WorkerSemaphore {
    /// Create a semaphore with `capacity` permits.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a slot is free, then hold it.
    pub async fn acquire(&self) -> Result<WorkerPermit, CopyError> {
        let permit = Arc::clone(&self.inner)
            .acquire_owned()
            .await
            .map_err(|_| CopyError::internal("worker semaphore closed"))?;
        Ok(WorkerPermit { _permit: permit })
    }

    /// Take a slot without waiting, if one is free.
    pub fn try_acquire(&self) -> Option<WorkerPermit> {
        Arc::clone(&self.inner)
            .try_acquire_owned()
            .ok()
            .map(|permit| WorkerPermit { _permit: permit })
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.inner.available_permits()
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
