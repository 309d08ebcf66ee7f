//! Result of a drained run.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::TaskOutcome;

/// Totals for a run that copied every matched file.
#[derive(Debug, Clone, Serialize)]
pub struct ExploreSummary {
    /// The timestamped directory the run created.
    pub output_root: PathBuf,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Directories listed.
    pub dirs_explored: u64,
    /// Files copied.
    pub files_copied: u64,
    /// Bytes copied.
    pub bytes_copied: u64,
    /// Wall time from seeding to drain.
    pub elapsed: Duration,
}

impl ExploreSummary {
    pub(crate) fn new(output_root: PathBuf, started_at: DateTime<Utc>) -> Self {
        Self {
            output_root,
            started_at,
            dirs_explored: 0,
            files_copied: 0,
            bytes_copied: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Fold one finished directory into the totals.
    pub(crate) fn absorb(&mut self, outcome: &TaskOutcome) {
        self.dirs_explored += 1;
        self.files_copied += outcome.files_copied;
        self.bytes_copied += outcome.bytes_copied;
    }

    /// Copy rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_copied as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}
