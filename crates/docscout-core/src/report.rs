//! Scan report and statistics.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::EntryWarning;

/// Counters collected during one discovery call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverStats {
    /// Entries produced by traversal (files and directories).
    pub entries_visited: u64,
    /// Directories skipped together with their subtree.
    pub dirs_pruned: u64,
    /// File candidates evaluated by the workers.
    pub files_evaluated: u64,
    /// Documents accepted.
    pub documents_matched: u64,
    /// Entries skipped because they could not be read.
    pub entries_skipped: u64,
}

/// Full outcome of a completed discovery call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Canonical scan root.
    pub root: PathBuf,
    /// Accepted documents.
    pub documents: Vec<Document>,
    /// Counters.
    pub stats: DiscoverStats,
    /// Entries that were skipped.
    pub warnings: Vec<EntryWarning>,
    /// Wall time of the scan.
    pub duration: Duration,
}

impl DiscoveryReport {
    /// Number of documents found.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Check if any entries were skipped.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = DiscoveryReport {
            root: PathBuf::from("/scan"),
            documents: Vec::new(),
            stats: DiscoverStats::default(),
            warnings: Vec::new(),
            duration: Duration::ZERO,
        };
        assert!(report.is_empty());
        assert!(!report.has_warnings());

        report.documents.push(Document::new("/scan/a.md", "a.md"));
        assert_eq!(report.len(), 1);
        assert!(!report.is_empty());
    }
}
