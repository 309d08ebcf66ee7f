//! Copy run configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{CopyError, ExtensionSet, FileSystem};

/// Smallest accepted worker count.
pub const MIN_WORKERS: usize = 1;

/// Largest accepted worker count.
pub const MAX_WORKERS: usize = 20;

/// Configuration for a copy run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate", error = "CopyError"))]
pub struct CopyConfig {
    /// Directory to crawl.
    pub source_dir: PathBuf,

    /// Directory under which the run's timestamped root is created.
    pub output_dir: PathBuf,

    /// Extensions to copy, without a leading dot.
    pub file_types: ExtensionSet,

    /// Number of directories explored concurrently.
    #[builder(default = "MIN_WORKERS")]
    #[serde(default = "default_workers")]
    pub num_workers: usize,
}

fn default_workers() -> usize {
    MIN_WORKERS
}

impl From<derive_builder::UninitializedFieldError> for CopyError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        CopyError::config(format!("missing {}", err.field_name()))
    }
}

impl CopyConfigBuilder {
    fn validate(&self) -> Result<(), CopyError> {
        if let Some(ref source) = self.source_dir {
            if source.as_os_str().is_empty() {
                return Err(CopyError::config("missing sourcedir"));
            }
        }
        if let Some(ref output) = self.output_dir {
            if output.as_os_str().is_empty() {
                return Err(CopyError::config("missing outputdir"));
            }
        }
        if let Some(ref types) = self.file_types {
            if types.is_empty() {
                return Err(CopyError::config("missing filetypes"));
            }
            if let Some(bad) = types.iter().find(|ext| ext.contains(['/', '\\'])) {
                return Err(CopyError::config(format!("invalid filetype '{bad}'")));
            }
        }
        if let Some(workers) = self.num_workers {
            if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
                return Err(CopyError::config(format!(
                    "invalid workers: {workers} (expected {MIN_WORKERS}-{MAX_WORKERS})"
                )));
            }
        }
        Ok(())
    }
}

impl CopyConfig {
    /// Create a new copy config builder.
    pub fn builder() -> CopyConfigBuilder {
        CopyConfigBuilder::default()
    }

    /// Build a config from a comma-separated extension list such as `"rs,toml"`.
    pub fn from_raw_types(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        file_types: &str,
        num_workers: usize,
    ) -> Result<Self, CopyError> {
        let segments: Vec<&str> = file_types.split(',').map(str::trim).collect();
        if segments.iter().any(|s| s.is_empty() || *s == ".") {
            return Err(CopyError::config(format!(
                "invalid filetypes '{file_types}'"
            )));
        }
        Self::builder()
            .source_dir(source_dir)
            .output_dir(output_dir)
            .file_types(ExtensionSet::new(segments))
            .num_workers(num_workers)
            .build()
    }

    /// Check that both directories exist and that the output directory is
    /// not the source directory or inside it.
    ///
    /// An output root under the source tree would be explored by its own
    /// run and copied into itself one level deeper each time.
    pub fn validate_paths(&self, fs: &dyn FileSystem) -> Result<(), CopyError> {
        if !fs.dir_exists(&self.source_dir) {
            return Err(CopyError::config(format!(
                "source dir does not exist: {}",
                self.source_dir.display()
            )));
        }
        if !fs.dir_exists(&self.output_dir) {
            return Err(CopyError::config(format!(
                "output dir does not exist: {}",
                self.output_dir.display()
            )));
        }

        let source = fs
            .canonicalize(&self.source_dir)
            .unwrap_or_else(|_| self.source_dir.clone());
        let output = fs
            .canonicalize(&self.output_dir)
            .unwrap_or_else(|_| self.output_dir.clone());
        if output.starts_with(&source) {
            return Err(CopyError::config(format!(
                "output dir {} is inside source dir {}",
                self.output_dir.display(),
                self.source_dir.display()
            )));
        }
        Ok(())
    }
}
