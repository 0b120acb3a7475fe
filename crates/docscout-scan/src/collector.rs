//! Single consumer of accepted documents.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use docscout_core::Document;

/// Drain the document queue until every worker has finished or the scan is
/// cancelled.
///
/// Returns `None` on cancellation; whatever was collected is dropped.
pub(crate) async fn collect(
    mut rx: mpsc::Receiver<Document>,
    cancel: CancellationToken,
) -> Option<Vec<Document>> {
    let mut documents = Vec::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            next = rx.recv() => match next {
                Some(document) => documents.push(document),
                None => return Some(documents),
            },
        }
    }
}
