//! Bounded pool of filter workers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, trace};

use docscout_core::{Candidate, Document, FilterMatcher};

use crate::progress::PipelineCounters;

/// Spawn `count` workers that share one candidate queue and feed one
/// document queue.
///
/// Every worker holds a clone of `tx`; the document queue closes once the
/// last worker exits.
pub(crate) fn spawn_workers(
    count: usize,
    rx: mpsc::Receiver<Candidate>,
    tx: mpsc::Sender<Document>,
    matcher: Arc<FilterMatcher>,
    root: Arc<PathBuf>,
    cancel: CancellationToken,
    counters: Arc<PipelineCounters>,
) -> JoinSet<()> {
    let rx = Arc::new(Mutex::new(rx));
    let mut set = JoinSet::new();

    for _ in 0..count {
        set.spawn(run_worker(
            Arc::clone(&rx),
            tx.clone(),
            Arc::clone(&matcher),
            Arc::clone(&root),
            cancel.clone(),
            Arc::clone(&counters),
        ));
    }

    set
}

async fn run_worker(
    rx: Arc<Mutex<mpsc::Receiver<Candidate>>>,
    tx: mpsc::Sender<Document>,
    matcher: Arc<FilterMatcher>,
    root: Arc<PathBuf>,
    cancel: CancellationToken,
    counters: Arc<PipelineCounters>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = async { rx.lock().await.recv().await } => next,
        };
        let Some(candidate) = next else {
            return;
        };

        if !candidate.is_dir {
            PipelineCounters::bump(&counters.files_evaluated);
        }
        let Some(document) = matcher.evaluate(&candidate, &root) else {
            continue;
        };
        PipelineCounters::bump(&counters.documents_matched);
        if tracing::enabled!(Level::TRACE) {
            let size = candidate.metadata().map(|m| m.len()).ok();
            trace!(path = %document.path.display(), depth = candidate.depth, ?size, "document matched");
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            sent = tx.send(document) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}
