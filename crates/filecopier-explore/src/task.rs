//! Work done for one dispatched directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::{Either, Itertools};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use filecopier_core::{CopyError, ExtensionSet, FileSystem, OutputLayout};

use crate::queue::WorkQueue;

/// What a finished directory task produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Subdirectories pushed back onto the work queue.
    pub subdirs: usize,
    /// Files copied out of this directory.
    pub files_copied: u64,
    /// Bytes copied out of this directory.
    pub bytes_copied: u64,
}

/// Lists one directory, copies its matched files and queues its children.
///
/// Cheap to clone; every dispatched directory gets its own clone.
#[derive(Clone)]
pub struct DirectoryTask {
    fs: Arc<dyn FileSystem>,
    extensions: Arc<ExtensionSet>,
    layout: Arc<OutputLayout>,
    queue: Arc<WorkQueue<PathBuf>>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DirectoryTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryTask")
            .field("extensions", &self.extensions)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl DirectoryTask {
    /// Create a task template sharing the run's state.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        extensions: Arc<ExtensionSet>,
        layout: Arc<OutputLayout>,
        queue: Arc<WorkQueue<PathBuf>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fs,
            extensions,
            layout,
            queue,
            cancel,
        }
    }

    /// Explore `dir`. Blocks on filesystem I/O.
    ///
    /// Subdirectories are queued only when every matched file was copied.
    pub fn run(&self, dir: &Path) -> Result<TaskOutcome, CopyError> {
        let (subdirs, matched) = self.partition(dir)?;

        let mut outcome = TaskOutcome::default();
        if !matched.is_empty() {
            let bytes = self.save_files(dir, &matched)?;
            outcome.files_copied = matched.len() as u64;
            outcome.bytes_copied = bytes;
        }

        outcome.subdirs = subdirs.len();
        self.queue.enqueue(subdirs);
        Ok(outcome)
    }

    /// Split a directory's entries into child directories and matched file names.
    fn partition(&self, dir: &Path) -> Result<(Vec<PathBuf>, Vec<OsString>), CopyError> {
        let entries = self
            .fs
            .list_entries(dir)
            .map_err(|source| CopyError::DirectoryRead {
                path: dir.to_path_buf(),
                source,
            })?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.is_dir || self.extensions.matches(&entry.name))
            .partition_map(|entry| {
                if entry.is_dir {
                    Either::Left(dir.join(entry.name))
                } else {
                    Either::Right(entry.name)
                }
            }))
    }

    /// Copy `files` from `dir` into its mirrored output directory.
    fn save_files(&self, dir: &Path, files: &[OsString]) -> Result<u64, CopyError> {
        let output_dir = self.layout.mirror(dir)?;
        self.fs
            .create_dir_all(&output_dir)
            .map_err(|source| CopyError::OutputDirCreate {
                path: output_dir.clone(),
                source,
            })?;

        let mut bytes = 0u64;
        for name in files {
            if self.cancel.is_cancelled() {
                return Err(CopyError::Cancelled);
            }

            let source_path = dir.join(name);
            let data = self
                .fs
                .read_file(&source_path)
                .map_err(|source| CopyError::FileRead {
                    path: source_path.clone(),
                    source,
                })?;

            let dest_path = output_dir.join(name);
            self.fs
                .write_file(&dest_path, &data)
                .map_err(|source| CopyError::FileWrite {
                    path: dest_path.clone(),
                    source,
                })?;

            debug!(from = %source_path.display(), to = %dest_path.display(), bytes = data.len(), "copied file");
            bytes += data.len() as u64;
        }
        Ok(bytes)
    }
}
