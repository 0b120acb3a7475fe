//! Concurrent document discovery engine for docscout.
//!
//! This crate walks a directory tree and returns the files that pass a
//! [`FilterSpec`], using a bounded three-stage pipeline.
//!
//! # Overview
//!
//! - **One traversal producer** walks the tree serially with jwalk and prunes
//!   excluded directories before descending into them
//! - **A fixed pool of filter workers** evaluates each entry against the
//!   compiled filter
//! - **One collector** accumulates accepted documents
//!
//! Stages are joined by bounded tokio channels, so a slow consumer applies
//! backpressure to the walk. Cancellation is cooperative through a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) checked at
//! every queue interaction; a cancelled scan returns no documents.
//!
//! # Example
//!
//! ```rust,no_run
//! use docscout_scan::{DiscoveryEngine, FilterSpec, ScanRequest};
//!
//! # async fn run() -> Result<(), docscout_scan::DiscoverError> {
//! let engine = DiscoveryEngine::new();
//! let request = ScanRequest::new("/path/to/notes", FilterSpec::default_documents());
//! let documents = engine.discover(request).await?;
//!
//! for doc in &documents {
//!     println!("{}", doc.relative_path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use docscout_scan::DiscoveryEngine;
//!
//! let engine = DiscoveryEngine::new();
//! let mut progress_rx = engine.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Visited {} entries", progress.entries_visited);
//!     }
//! });
//! ```

mod collector;
mod engine;
mod listing;
mod progress;
mod traversal;
mod workers;

pub use engine::{DiscoveryEngine, ScanRequest};
pub use progress::DiscoverProgress;

// Re-export core types for convenience
pub use docscout_core::{
    CancelReason, Candidate, DirEntryInfo, DiscoverConfig, DiscoverError, DiscoverStats,
    DiscoveryReport, Document, EntryErrorPolicy, EntryWarning, FilterMatcher, FilterSpec,
    WarningKind, matches_pattern,
};
pub use tokio_util::sync::CancellationToken;
