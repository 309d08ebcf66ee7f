//! Extension matching for candidate files.

use std::collections::BTreeSet;
use std::ffi::OsStr;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// The set of accepted file extensions, stored without a leading dot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionSet {
    extensions: BTreeSet<CompactString>,
}

impl ExtensionSet {
    /// Create a set from extension strings.
    ///
    /// A single leading dot is stripped, so `".rs"` and `"rs"` are the same
    /// entry. Empty strings are kept out of the set.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| CompactString::from(normalize(ext.as_ref())))
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    /// Check whether a file name ends with `.<ext>` for some accepted `ext`.
    ///
    /// The comparison is case-sensitive. Names that are not valid UTF-8
    /// never match.
    pub fn matches(&self, file_name: &OsStr) -> bool {
        let Some(name) = file_name.to_str() else {
            return false;
        };
        self.extensions.iter().any(|ext| {
            name.len() > ext.len()
                && name.ends_with(ext.as_str())
                && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
        })
    }

    /// Iterate over the accepted extensions in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(CompactString::as_str)
    }

    /// Number of accepted extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Check if no extension is accepted.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

fn normalize(ext: &str) -> &str {
    let ext = ext.trim();
    ext.strip_prefix('.').unwrap_or(ext)
}
