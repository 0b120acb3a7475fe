//! Entry records passed through and produced by the discovery pipeline.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A filesystem entry produced by traversal and not yet filtered.
///
/// Owned by exactly one pipeline stage at a time.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// The entry's own file name.
    pub name: CompactString,
    /// Name of the immediate parent directory.
    pub parent_name: CompactString,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Depth below the scan root (root children are depth 1).
    pub depth: usize,
}

impl Candidate {
    /// Create a candidate, deriving names from the path.
    pub fn new(path: impl Into<PathBuf>, is_dir: bool, depth: usize) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        let parent_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();

        Self {
            path,
            name,
            parent_name,
            is_dir,
            depth,
        }
    }

    /// Read the entry's metadata (size, mtime, ...) without following links.
    pub fn metadata(&self) -> std::io::Result<std::fs::Metadata> {
        std::fs::symlink_metadata(&self.path)
    }
}

/// A file accepted by the filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the scan root.
    #[serde(rename = "name")]
    pub relative_path: PathBuf,
}

impl Document {
    /// Create a document from its parts.
    pub fn new(path: impl Into<PathBuf>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative_path: relative_path.into(),
        }
    }

    /// Create a document for `path` relative to `root`.
    ///
    /// Returns `None` if `path` is not below `root`.
    pub fn under_root(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        Some(Self::new(path, relative))
    }
}

/// One item of a non-recursive directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntryInfo {
    /// File or directory name.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl DirEntryInfo {
    /// Create a listing item.
    pub fn new(name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
        }
    }
}
