//! Scan progress reporting.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use docscout_core::DiscoverStats;

/// Progress information during a discovery call.
#[derive(Debug, Clone)]
pub struct DiscoverProgress {
    /// Root of the scan this event belongs to.
    pub root: PathBuf,
    /// Entries produced by traversal so far.
    pub entries_visited: u64,
    /// Documents accepted so far.
    pub documents_matched: u64,
    /// Directories pruned so far.
    pub dirs_pruned: u64,
    /// Entry most recently produced.
    pub current_path: PathBuf,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
    /// Set on the final event of a scan.
    pub finished: bool,
}

impl DiscoverProgress {
    /// Calculate scan rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.entries_visited as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Counters shared by the pipeline stages of one scan.
#[derive(Debug, Default)]
pub(crate) struct PipelineCounters {
    pub entries_visited: AtomicU64,
    pub dirs_pruned: AtomicU64,
    pub files_evaluated: AtomicU64,
    pub documents_matched: AtomicU64,
    pub entries_skipped: AtomicU64,
}

impl PipelineCounters {
    pub fn bump(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> DiscoverStats {
        DiscoverStats {
            entries_visited: self.entries_visited.load(Ordering::Relaxed),
            dirs_pruned: self.dirs_pruned.load(Ordering::Relaxed),
            files_evaluated: self.files_evaluated.load(Ordering::Relaxed),
            documents_matched: self.documents_matched.load(Ordering::Relaxed),
            entries_skipped: self.entries_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Emits periodic progress events for one scan.
///
/// Sending never blocks; events are dropped when nobody is subscribed.
#[derive(Debug, Clone)]
pub(crate) struct ProgressReporter {
    tx: broadcast::Sender<DiscoverProgress>,
    root: PathBuf,
    start: Instant,
    interval: u64,
}

impl ProgressReporter {
    pub fn new(tx: broadcast::Sender<DiscoverProgress>, root: PathBuf, interval: u64) -> Self {
        Self {
            tx,
            root,
            start: Instant::now(),
            interval: interval.max(1),
        }
    }

    /// Report if `visited` falls on the configured interval.
    pub fn tick(&self, visited: u64, counters: &PipelineCounters, current: &Path) {
        if visited % self.interval == 0 {
            self.send(counters, current, false);
        }
    }

    /// Send the final event.
    pub fn finish(&self, counters: &PipelineCounters) {
        self.send(counters, &self.root, true);
    }

    fn send(&self, counters: &PipelineCounters, current: &Path, finished: bool) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        let stats = counters.snapshot();
        let _ = self.tx.send(DiscoverProgress {
            root: self.root.clone(),
            entries_visited: stats.entries_visited,
            documents_matched: stats.documents_matched,
            dirs_pruned: stats.dirs_pruned,
            current_path: current.to_path_buf(),
            elapsed: self.start.elapsed(),
            finished,
        });
    }
}
