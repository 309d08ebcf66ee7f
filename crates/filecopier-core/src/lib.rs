//! Core types and traits for file-copier.
//!
//! This crate provides the pieces shared by the copy engine and the CLI:
//! run configuration, the error type, extension matching, output tree
//! layout, and the filesystem capability trait.

mod config;
mod error;
mod fs;
mod layout;
mod matcher;

pub use config::{CopyConfig, CopyConfigBuilder, MAX_WORKERS, MIN_WORKERS};
pub use error::CopyError;
pub use fs::{DirEntryInfo, FileSystem, LocalFs};
pub use layout::{OUTPUT_ROOT_PREFIX, OutputLayout};
pub use matcher::ExtensionSet;
