//! Output tree layout: naming the run's root and mirroring source paths.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::CopyError;

/// Prefix of every run's output root directory name.
pub const OUTPUT_ROOT_PREFIX: &str = "copied_files_";

/// Maps directories under the source root onto the run's output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    source_root: PathBuf,
    output_root: PathBuf,
}

impl OutputLayout {
    /// Create a layout from a source root and an already chosen output root.
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Name of the output root for a run started at `started`.
    ///
    /// Second resolution: two runs within the same second get the same name.
    pub fn output_root_name(started: DateTime<Utc>) -> String {
        format!("{OUTPUT_ROOT_PREFIX}{}", started.timestamp())
    }

    /// Full output root path for a run started at `started`.
    pub fn output_root_for(output_dir: &Path, started: DateTime<Utc>) -> PathBuf {
        output_dir.join(Self::output_root_name(started))
    }

    /// The source root.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// The output root.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Map a path under the source root to the mirrored output path.
    ///
    /// The source root is removed component-wise, so a later path segment
    /// that happens to repeat the root's text is left alone.
    pub fn mirror(&self, path: &Path) -> Result<PathBuf, CopyError> {
        let relative = path.strip_prefix(&self.source_root).map_err(|_| {
            CopyError::internal(format!(
                "{} is not under source root {}",
                path.display(),
                self.source_root.display()
            ))
        })?;
        if relative.as_os_str().is_empty() {
            Ok(self.output_root.clone())
        } else {
            Ok(self.output_root.join(relative))
        }
    }
}
