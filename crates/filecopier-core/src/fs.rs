//! Filesystem capability used by the copy engine.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One immediate entry of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// Entry name, without the parent path.
    pub name: OsString,
    /// Whether the entry itself is a directory (symlinks are not followed).
    pub is_dir: bool,
}

impl DirEntryInfo {
    /// Create a directory entry.
    pub fn dir(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    /// Create a non-directory entry.
    pub fn file(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }
}

/// Filesystem operations the engine needs.
///
/// Every call is blocking; the engine runs them on blocking worker threads.
pub trait FileSystem: Send + Sync {
    /// Check whether `path` exists and is a directory.
    fn dir_exists(&self, path: &Path) -> bool;

    /// Create a single directory. Fails if it already exists.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and any missing ancestors. Succeeds if it exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// List the immediate entries of a directory.
    fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>>;

    /// Read a whole file.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write `contents` to `path`, creating or truncating it.
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Resolve `path` to an absolute form without `..` or symlinks.
    ///
    /// Implementations without a notion of links may return the path as is.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        fs::read_dir(path)?
            .map(|entry| -> io::Result<DirEntryInfo> {
                let entry = entry?;
                Ok(DirEntryInfo {
                    name: entry.file_name(),
                    is_dir: entry.file_type()?.is_dir(),
                })
            })
            .collect()
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}
