//! Holder for the first error a run hits.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use filecopier_core::CopyError;

/// Keeps the first recorded error and drops every later one.
#[derive(Debug, Default)]
pub struct FirstError {
    slot: Mutex<Option<CopyError>>,
}

impl FirstError {
    /// Create an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err` unless an error is already held.
    ///
    /// Returns `true` if `err` became the held error.
    pub fn record(&self, err: CopyError) -> bool {
        let mut slot = self.lock();
        if slot.is_some() {
            warn!(error = %err, "discarding error after first failure");
            return false;
        }
        *slot = Some(err);
        true
    }

    /// Check whether an error has been recorded.
    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// Take the held error, leaving the holder empty.
    pub fn take(&self) -> Option<CopyError> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CopyError>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
