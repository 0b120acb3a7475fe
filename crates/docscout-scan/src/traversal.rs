//! Serial traversal producer.
//!
//! Walks the root with jwalk on the calling (blocking) thread and hands each
//! entry to the worker queue. Excluded directories are removed from their
//! parent's child list before jwalk descends, so nothing beneath them is ever
//! read.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use jwalk::{Parallelism, WalkDir};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use docscout_core::{
    Candidate, DiscoverConfig, DiscoverError, EntryWarning, FilterMatcher, WarningKind,
};

use crate::progress::{PipelineCounters, ProgressReporter};

/// Everything the producer needs for one scan.
pub(crate) struct Traversal {
    pub root: PathBuf,
    pub matcher: Arc<FilterMatcher>,
    pub config: DiscoverConfig,
    pub cancel: CancellationToken,
    pub counters: Arc<PipelineCounters>,
    pub progress: ProgressReporter,
}

impl Traversal {
    /// Walk the tree, sending candidates until done or cancelled.
    ///
    /// Returns the warnings for skipped entries. In fail-fast mode the first
    /// unreadable entry cancels the scan and is returned as an error.
    /// Dropping `tx` on return closes the worker queue.
    pub fn run(
        self,
        tx: mpsc::Sender<Candidate>,
        handle: Handle,
    ) -> Result<Vec<EntryWarning>, DiscoverError> {
        let Traversal {
            root,
            matcher,
            config,
            cancel,
            counters,
            progress,
        } = self;

        let strict = config.is_strict();
        let mut warnings = Vec::new();

        let prune_matcher = Arc::clone(&matcher);
        let prune_cancel = cancel.clone();
        let prune_counters = Arc::clone(&counters);

        let walker = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(config.follow_symlinks)
            .sort(false)
            .min_depth(1)
            .max_depth(config.max_depth.unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                if prune_cancel.is_cancelled() {
                    children.clear();
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) if entry.file_type().is_dir() => {
                        let name = entry.file_name().to_string_lossy();
                        if prune_matcher.prunes_dir(&name) {
                            debug!(path = %entry.path().display(), "pruning excluded directory");
                            prune_counters.dirs_pruned.fetch_add(1, Ordering::Relaxed);
                            false
                        } else {
                            true
                        }
                    }
                    _ => true,
                });
            });

        for entry_result in walker {
            if cancel.is_cancelled() {
                debug!(root = %root.display(), "traversal stopped by cancellation");
                break;
            }

            let mut entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let warning = warning_from_walk_error(&err, &root);
                    record_skip(warning, strict, &cancel, &counters, &mut warnings)?;
                    continue;
                }
            };

            // Unreadable directory: the entry itself is fine, its children are lost.
            if let Some(err) = entry.read_children_error.take() {
                let warning = warning_from_walk_error(&err, &entry.path());
                record_skip(warning, strict, &cancel, &counters, &mut warnings)?;
            }

            let visited = PipelineCounters::bump(&counters.entries_visited);
            let candidate = Candidate::new(entry.path(), entry.file_type().is_dir(), entry.depth);
            progress.tick(visited, &counters, &candidate.path);

            if !dispatch(&handle, &tx, &cancel, candidate) {
                debug!(root = %root.display(), "worker queue closed, stopping traversal");
                break;
            }
        }

        Ok(warnings)
    }
}

/// Send a candidate, waiting for queue space unless the scan is cancelled.
///
/// Returns `false` when the scan should stop producing.
fn dispatch(
    handle: &Handle,
    tx: &mpsc::Sender<Candidate>,
    cancel: &CancellationToken,
    candidate: Candidate,
) -> bool {
    match tx.try_send(candidate) {
        Ok(()) => true,
        Err(TrySendError::Closed(_)) => false,
        Err(TrySendError::Full(candidate)) => handle.block_on(async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                sent = tx.send(candidate) => sent.is_ok(),
            }
        }),
    }
}

/// Apply the entry error policy to one unreadable entry.
fn record_skip(
    warning: EntryWarning,
    strict: bool,
    cancel: &CancellationToken,
    counters: &PipelineCounters,
    warnings: &mut Vec<EntryWarning>,
) -> Result<(), DiscoverError> {
    if strict {
        warn!(path = %warning.path.display(), error = %warning.message, "aborting scan on unreadable entry");
        cancel.cancel();
        return Err(warning.into_error());
    }
    warn!(path = %warning.path.display(), error = %warning.message, "skipping unreadable entry");
    counters.entries_skipped.fetch_add(1, Ordering::Relaxed);
    warnings.push(warning);
    Ok(())
}

fn warning_from_walk_error(err: &jwalk::Error, fallback: &Path) -> EntryWarning {
    let path = err.path().unwrap_or(fallback).to_path_buf();
    if err.loop_ancestor().is_some() {
        return EntryWarning::new(path, err.to_string(), WarningKind::Loop);
    }
    match err.io_error() {
        Some(io) => EntryWarning::from_io(path, io),
        None => EntryWarning::new(path, err.to_string(), WarningKind::ReadError),
    }
}
