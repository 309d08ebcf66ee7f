//! Scheduler that drives directory tasks until the tree is drained.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use filecopier_core::{CopyConfig, CopyError, FileSystem, LocalFs, OutputLayout};

use crate::first_error::FirstError;
use crate::queue::{QueueError, WorkQueue};
use crate::semaphore::WorkerSemaphore;
use crate::summary::ExploreSummary;
use crate::task::{DirectoryTask, TaskOutcome};

/// Validate `config` against the local disk and copy every matched file.
pub async fn copy_files(config: CopyConfig) -> Result<ExploreSummary, CopyError> {
    copy_files_with(config, Arc::new(LocalFs), CancellationToken::new()).await
}

/// Validate `config` against `fs` and run until drained, failed or cancelled.
pub async fn copy_files_with(
    config: CopyConfig,
    fs: Arc<dyn FileSystem>,
    cancel: CancellationToken,
) -> Result<ExploreSummary, CopyError> {
    config.validate_paths(fs.as_ref())?;
    Explorer::new(config, fs).run(cancel).await
}

/// Explores the source tree with at most `num_workers` directories in flight.
///
/// Subdirectories found by a task go back onto one shared queue; only the
/// scheduler dequeues and dispatches. The run ends once the queue is empty
/// and no task is in flight.
pub struct Explorer {
    config: CopyConfig,
    fs: Arc<dyn FileSystem>,
    started_at: Option<DateTime<Utc>>,
}

impl Explorer {
    /// Create an explorer. Paths in `config` are assumed to be validated.
    pub fn new(config: CopyConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            config,
            fs,
            started_at: None,
        }
    }

    /// Pin the run's start time instead of reading the clock.
    ///
    /// The output root's name is derived from it.
    pub fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Run to completion.
    ///
    /// On failure, dispatch stops but every in-flight task is awaited before
    /// the first recorded error is returned. Files already copied stay.
    pub async fn run(self, cancel: CancellationToken) -> Result<ExploreSummary, CopyError> {
        let start = Instant::now();
        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let output_root = self.make_output_root(started_at)?;
        info!(
            source = %self.config.source_dir.display(),
            output = %output_root.display(),
            workers = self.config.num_workers,
            "starting exploration"
        );

        let queue = Arc::new(WorkQueue::new());
        queue.push(self.config.source_dir.clone());

        let task = DirectoryTask::new(
            Arc::clone(&self.fs),
            Arc::new(self.config.file_types.clone()),
            Arc::new(OutputLayout::new(&self.config.source_dir, &output_root)),
            Arc::clone(&queue),
            cancel.clone(),
        );
        let semaphore = WorkerSemaphore::new(self.config.num_workers);
        let first_error = Arc::new(FirstError::new());
        let mut in_flight: JoinSet<Option<TaskOutcome>> = JoinSet::new();
        let mut summary = ExploreSummary::new(output_root, started_at);
        let mut drained = false;

        loop {
            while let Some(joined) = in_flight.try_join_next() {
                settle(joined, &first_error, &mut summary);
            }
            if first_error.is_set() || cancel.is_cancelled() {
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.acquire() => match permit {
                    Ok(permit) => permit,
                    Err(err) => {
                        first_error.record(err);
                        break;
                    }
                },
            };
            // A failing task records its error before giving its permit
            // back, so waking up on that permit must not dispatch more work.
            if first_error.is_set() || cancel.is_cancelled() {
                permit.release();
                break;
            }

            match queue.dequeue() {
                Ok(dir) => {
                    debug!(dir = %dir.display(), in_flight = in_flight.len() + 1, "dispatching");
                    let task = task.clone();
                    let first_error = Arc::clone(&first_error);
                    in_flight.spawn_blocking(move || {
                        // Held until the directory is finished.
                        let _permit = permit;
                        match task.run(&dir) {
                            Ok(outcome) => Some(outcome),
                            Err(err) => {
                                first_error.record(explain(&dir, err));
                                None
                            }
                        }
                    });
                }
                Err(QueueError::Empty) => {
                    permit.release();
                    // Only this loop joins tasks, and a task queues its
                    // children before it completes. With nothing left to
                    // join, an empty queue stays empty.
                    if in_flight.is_empty() {
                        drained = true;
                        break;
                    }
                    if let Some(joined) = in_flight.join_next().await {
                        settle(joined, &first_error, &mut summary);
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            settle(joined, &first_error, &mut summary);
        }

        if let Some(err) = first_error.take() {
            return Err(err);
        }
        if !drained {
            return Err(CopyError::Cancelled);
        }

        summary.elapsed = start.elapsed();
        info!(
            dirs = summary.dirs_explored,
            files = summary.files_copied,
            bytes = summary.bytes_copied,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "exploration drained"
        );
        Ok(summary)
    }

    /// Create this run's timestamped output root.
    ///
    /// Plain `create_dir`: a second run in the same second fails here
    /// rather than writing into the first run's tree.
    fn make_output_root(&self, started_at: DateTime<Utc>) -> Result<PathBuf, CopyError> {
        let output_root = OutputLayout::output_root_for(&self.config.output_dir, started_at);
        self.fs
            .create_dir(&output_root)
            .map_err(|source| CopyError::OutputDirCreate {
                path: output_root.clone(),
                source,
            })?;
        Ok(output_root)
    }
}

/// Account for one joined task.
fn settle(
    joined: Result<Option<TaskOutcome>, JoinError>,
    first_error: &FirstError,
    summary: &mut ExploreSummary,
) {
    match joined {
        Ok(Some(outcome)) => summary.absorb(&outcome),
        // The task already recorded its error.
        Ok(None) => {}
        Err(err) => {
            first_error.record(CopyError::TaskFailed {
                message: err.to_string(),
            });
        }
    }
}

/// Attach the failing directory to internal errors that lack a path.
fn explain(dir: &Path, err: CopyError) -> CopyError {
    match err {
        CopyError::QueueInternal { message } => CopyError::QueueInternal {
            message: format!("failed to explore {}: {message}", dir.display()),
        },
        other => other,
    }
}
