//! Error types for copy runs.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can end a copy run.
///
/// Every variant is fatal: nothing is retried or downgraded to a warning,
/// and a run surfaces at most one of them.
#[derive(Debug, Error)]
pub enum CopyError {
    /// A precondition failed before traversal began.
    #[error("Invalid configuration: {message}")]
    ConfigurationInvalid { message: String },

    /// A directory's entries could not be listed.
    #[error("Could not read directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mirrored output directory could not be created.
    #[error("Could not create output directory {}: {source}", path.display())]
    OutputDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A matched file could not be read from the source tree.
    #[error("Could not read file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A matched file could not be written to the output tree.
    #[error("Could not write file {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The work queue was used in a way that breaks its invariants.
    #[error("An unexpected error occurred: {message}")]
    QueueInternal { message: String },

    /// A worker task panicked or was torn down by the runtime.
    #[error("Worker task failed: {message}")]
    TaskFailed { message: String },

    /// The caller cancelled the run before it drained.
    #[error("Operation cancelled")]
    Cancelled,
}

impl CopyError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            message: message.into(),
        }
    }

    /// Create an internal queue invariant error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::QueueInternal {
            message: message.into(),
        }
    }

    /// Whether this error comes from a logic bug rather than the filesystem.
    pub fn is_fatal_internal(&self) -> bool {
        matches!(self, Self::QueueInternal { .. } | Self::TaskFailed { .. })
    }

    /// The path the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::DirectoryRead { path, .. }
            | Self::OutputDirCreate { path, .. }
            | Self::FileRead { path, .. }
            | Self::FileWrite { path, .. } => Some(path),
            _ => None,
        }
    }
}
