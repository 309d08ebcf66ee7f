//! Concurrent exploration and copy engine for file-copier.
//!
//! The engine walks a source tree one directory per task:
//!
//! - **Work queue** of pending directories, fed by the tasks themselves
//! - **Semaphore** bounding how many directory tasks run at once
//! - **Directory task** that lists a directory, copies matched files into
//!   the mirrored output tree and queues the subdirectories
//! - **Explorer** that dispatches tasks until the queue is empty and
//!   nothing is in flight, surfacing only the first error
//!
//! # Example
//!
//! ```rust,no_run
//! use filecopier_explore::{CopyConfig, copy_files};
//!
//! # async fn demo() -> Result<(), filecopier_explore::CopyError> {
//! let config = CopyConfig::from_raw_types("/path/to/src", "/path/to/out", "rs,toml", 4)?;
//! let summary = copy_files(config).await?;
//!
//! println!("Copied {} files into {}", summary.files_copied, summary.output_root.display());
//! # Ok(())
//! # }
//! ```

mod explorer;
mod first_error;
mod queue;
mod semaphore;
mod summary;
mod task;

pub use explorer::{Explorer, copy_files, copy_files_with};
pub use first_error::FirstError;
pub use queue::{QueueError, WorkQueue};
pub use semaphore::{WorkerPermit, WorkerSemaphore};
pub use summary::ExploreSummary;
pub use task::{DirectoryTask, TaskOutcome};

// Re-export core types for convenience
pub use filecopier_core::{
    CopyConfig, CopyError, DirEntryInfo, ExtensionSet, FileSystem, LocalFs, OutputLayout,
};
