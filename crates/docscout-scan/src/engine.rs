//! Discovery engine: wires traversal, filter workers and collector into a
//! bounded pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use docscout_core::{
    CancelReason, DirEntryInfo, DiscoverConfig, DiscoverError, DiscoverStats, DiscoveryReport,
    Document, FilterMatcher, FilterSpec,
};

use crate::collector::collect;
use crate::listing::read_listing;
use crate::progress::{DiscoverProgress, PipelineCounters, ProgressReporter};
use crate::traversal::Traversal;
use crate::workers::spawn_workers;

/// Capacity of the progress broadcast channel.
const PROGRESS_CHANNEL_SIZE: usize = 100;

/// One discovery call: where to look, what to keep, and when to give up.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Directory to scan.
    pub root: PathBuf,
    /// Include/exclude rules.
    pub filter: FilterSpec,
    /// Cancelling this token aborts the scan.
    pub cancel: CancellationToken,
    /// Optional deadline measured from the start of the call.
    pub timeout: Option<Duration>,
}

impl ScanRequest {
    /// Create a request with a fresh cancellation token and no deadline.
    pub fn new(root: impl Into<PathBuf>, filter: FilterSpec) -> Self {
        Self {
            root: root.into(),
            filter,
            cancel: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Abort the scan if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Concurrent document discovery engine.
///
/// Each call builds its own pipeline; nothing but configuration and the
/// progress channel is shared between calls, so one engine can serve
/// concurrent scans.
pub struct DiscoveryEngine {
    config: DiscoverConfig,
    progress_tx: broadcast::Sender<DiscoverProgress>,
}

impl DiscoveryEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self {
            config: DiscoverConfig::default(),
            progress_tx,
        }
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(config: DiscoverConfig) -> Result<Self, DiscoverError> {
        config
            .validate()
            .map_err(|message| DiscoverError::InvalidConfig { message })?;
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Ok(Self {
            config,
            progress_tx,
        })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &DiscoverConfig {
        &self.config
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoverProgress> {
        self.progress_tx.subscribe()
    }

    /// Find every document under the request root.
    ///
    /// Returns an empty list when nothing matches. A cancelled or timed-out
    /// scan returns [`DiscoverError::Cancelled`] and no documents.
    pub async fn discover(&self, request: ScanRequest) -> Result<Vec<Document>, DiscoverError> {
        self.discover_report(request).await.map(|report| report.documents)
    }

    /// Like [`discover`](Self::discover), with statistics and skipped-entry
    /// warnings.
    pub async fn discover_report(
        &self,
        request: ScanRequest,
    ) -> Result<DiscoveryReport, DiscoverError> {
        let start = Instant::now();
        let ScanRequest {
            root,
            filter,
            cancel,
            timeout,
        } = request;

        let root = tokio::task::spawn_blocking(move || resolve_root(&root))
            .await
            .map_err(|e| DiscoverError::Internal {
                message: e.to_string(),
            })??;

        if cancel.is_cancelled() {
            return Err(DiscoverError::Cancelled {
                reason: CancelReason::Requested,
            });
        }

        let matcher = Arc::new(filter.compile());

        if root_is_excluded(&root, &matcher) {
            debug!(root = %root.display(), "scan root matches an excluded directory name");
            return Ok(DiscoveryReport {
                root,
                documents: Vec::new(),
                stats: DiscoverStats {
                    dirs_pruned: 1,
                    ..DiscoverStats::default()
                },
                warnings: Vec::new(),
                duration: start.elapsed(),
            });
        }

        debug!(
            root = %root.display(),
            workers = self.config.workers,
            strict = self.config.is_strict(),
            "starting discovery"
        );

        let scan_cancel = cancel.child_token();
        // Dropping the call's future tears the whole pipeline down.
        let _teardown = scan_cancel.clone().drop_guard();
        let deadline = Deadline::arm(timeout, &scan_cancel);

        let counters = Arc::new(PipelineCounters::default());
        let progress = ProgressReporter::new(
            self.progress_tx.clone(),
            root.clone(),
            self.config.progress_interval,
        );

        let (candidate_tx, candidate_rx) = mpsc::channel(self.config.candidate_queue);
        let (document_tx, document_rx) = mpsc::channel(self.config.result_queue);

        let traversal = Traversal {
            root: root.clone(),
            matcher: Arc::clone(&matcher),
            config: self.config.clone(),
            cancel: scan_cancel.clone(),
            counters: Arc::clone(&counters),
            progress: progress.clone(),
        };
        let handle = Handle::current();
        let producer = tokio::task::spawn_blocking(move || traversal.run(candidate_tx, handle));

        let mut workers = spawn_workers(
            self.config.workers,
            candidate_rx,
            document_tx,
            Arc::clone(&matcher),
            Arc::new(root.clone()),
            scan_cancel.clone(),
            Arc::clone(&counters),
        );

        let collector = tokio::spawn(collect(document_rx, scan_cancel.clone()));

        // Join every stage before deciding the outcome.
        let collected = collector.await;
        let mut task_failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                task_failure.get_or_insert_with(|| e.to_string());
            }
        }
        let produced = producer.await;
        let deadline_fired = deadline.disarm();

        let warnings = match produced {
            Ok(Ok(warnings)) => warnings,
            Ok(Err(e)) => return Err(e),
            Err(e) => {
                return Err(DiscoverError::Internal {
                    message: e.to_string(),
                });
            }
        };
        if let Some(message) = task_failure {
            return Err(DiscoverError::Internal { message });
        }

        let collected = collected.map_err(|e| DiscoverError::Internal {
            message: e.to_string(),
        })?;
        let Some(mut documents) = collected else {
            let reason = if !cancel.is_cancelled() && deadline_fired {
                CancelReason::DeadlineExceeded
            } else {
                CancelReason::Requested
            };
            debug!(root = %root.display(), %reason, "discovery cancelled");
            return Err(DiscoverError::Cancelled { reason });
        };

        if self.config.sort_results {
            documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        }

        progress.finish(&counters);
        let stats = counters.snapshot();
        let duration = start.elapsed();

        info!(
            root = %root.display(),
            documents = documents.len(),
            entries = stats.entries_visited,
            pruned = stats.dirs_pruned,
            skipped = stats.entries_skipped,
            elapsed_ms = duration.as_millis() as u64,
            "discovery finished"
        );

        Ok(DiscoveryReport {
            root,
            documents,
            stats,
            warnings,
            duration,
        })
    }

    /// List the immediate children of a directory, sorted by name.
    pub async fn list_directory(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<DirEntryInfo>, DiscoverError> {
        let path = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || read_listing(&path))
            .await
            .map_err(|e| DiscoverError::Internal {
                message: e.to_string(),
            })?
    }
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonicalize the root and check that it is a readable directory.
fn resolve_root(path: &Path) -> Result<PathBuf, DiscoverError> {
    if path.as_os_str().is_empty() {
        return Err(DiscoverError::InvalidRoot {
            path: path.to_path_buf(),
            reason: "empty path",
        });
    }

    let root = path
        .canonicalize()
        .map_err(|e| DiscoverError::root_io(path, e))?;
    let metadata = std::fs::metadata(&root).map_err(|e| DiscoverError::root_io(&root, e))?;
    if !metadata.is_dir() {
        return Err(DiscoverError::not_a_directory(path));
    }

    // Fail now rather than losing the error inside the walk.
    std::fs::read_dir(&root).map_err(|e| DiscoverError::root_io(&root, e))?;

    Ok(root)
}

fn root_is_excluded(root: &Path, matcher: &FilterMatcher) -> bool {
    let Some(name) = root.file_name() else {
        return false;
    };
    matcher.prunes_dir(&name.to_string_lossy())
}

/// Cancels the scan when the request deadline passes.
struct Deadline {
    task: Option<JoinHandle<()>>,
    fired: Arc<AtomicBool>,
}

impl Deadline {
    fn arm(timeout: Option<Duration>, cancel: &CancellationToken) -> Self {
        let fired = Arc::new(AtomicBool::new(false));
        let task = match timeout {
            None => None,
            Some(timeout) if timeout.is_zero() => {
                fired.store(true, Ordering::SeqCst);
                cancel.cancel();
                None
            }
            Some(timeout) => {
                let cancel = cancel.clone();
                let fired = Arc::clone(&fired);
                Some(tokio::spawn(async move {
                    tokio::select! {
                        _ = tokio::time::sleep(timeout) => {
                            fired.store(true, Ordering::SeqCst);
                            cancel.cancel();
                        }
                        _ = cancel.cancelled() => {}
                    }
                }))
            }
        };
        Self { task, fired }
    }

    /// Stop the timer and report whether it fired.
    fn disarm(self) -> bool {
        if let Some(task) = self.task {
            task.abort();
        }
        self.fired.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_root_rejects_file_and_missing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.md");
        fs::write(&file, "a").unwrap();

        assert!(resolve_root(&file).unwrap_err().is_invalid_root());
        assert!(resolve_root(&temp.path().join("nope")).unwrap_err().is_invalid_root());
        assert!(resolve_root(Path::new("")).unwrap_err().is_invalid_root());
        assert!(resolve_root(temp.path()).unwrap().is_absolute());
    }

    #[test]
    fn test_root_is_excluded() {
        let matcher = FilterSpec::default_documents().compile();
        assert!(root_is_excluded(Path::new("/repo/.git"), &matcher));
        assert!(!root_is_excluded(Path::new("/repo/docs"), &matcher));
        assert!(!root_is_excluded(Path::new("/"), &matcher));
    }

    #[tokio::test]
    async fn test_zero_deadline_fires_immediately() {
        let cancel = CancellationToken::new();
        let deadline = Deadline::arm(Some(Duration::ZERO), &cancel);
        assert!(cancel.is_cancelled());
        assert!(deadline.disarm());
    }

    #[tokio::test]
    async fn test_disarmed_deadline_does_not_fire() {
        let cancel = CancellationToken::new();
        let deadline = Deadline::arm(Some(Duration::from_secs(60)), &cancel);
        assert!(!deadline.disarm());
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_with_config_keeps_config() {
        let config = DiscoverConfig {
            workers: 3,
            ..DiscoverConfig::default()
        };
        let engine = DiscoveryEngine::with_config(config.clone()).unwrap();
        assert_eq!(engine.config(), &config);
        assert_eq!(DiscoveryEngine::new().config(), &DiscoverConfig::default());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = DiscoverConfig {
            workers: 0,
            ..DiscoverConfig::default()
        };
        assert!(matches!(
            DiscoveryEngine::with_config(config),
            Err(DiscoverError::InvalidConfig { .. })
        ));
    }
}
