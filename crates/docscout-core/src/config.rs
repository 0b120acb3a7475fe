//! Discovery engine configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// What to do when a single entry cannot be read during traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryErrorPolicy {
    /// Record a warning and keep scanning.
    #[default]
    Skip,
    /// Abort the whole scan on the first unreadable entry.
    FailFast,
}

/// Configuration for the discovery engine.
///
/// Values here tune the pipeline; the filter rules travel with each request.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct DiscoverConfig {
    /// Number of concurrent filter workers.
    #[builder(default = "8")]
    pub workers: usize,

    /// Capacity of the traversal -> worker queue.
    #[builder(default = "1000")]
    pub candidate_queue: usize,

    /// Capacity of the worker -> collector queue.
    #[builder(default = "100")]
    pub result_queue: usize,

    /// Policy for unreadable entries.
    #[builder(default)]
    pub entry_errors: EntryErrorPolicy,

    /// Follow symbolic links while walking.
    #[builder(default = "false")]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    pub max_depth: Option<usize>,

    /// Sort documents by relative path before returning.
    #[builder(default = "true")]
    pub sort_results: bool,

    /// Emit a progress event every this many entries.
    #[builder(default = "1000")]
    pub progress_interval: u64,
}

impl DiscoverConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("workers must be at least 1".to_string());
        }
        if self.candidate_queue == Some(0) || self.result_queue == Some(0) {
            return Err("queue capacities must be at least 1".to_string());
        }
        Ok(())
    }
}

impl DiscoverConfig {
    /// Create a new config builder.
    pub fn builder() -> DiscoverConfigBuilder {
        DiscoverConfigBuilder::default()
    }

    /// Check values that serde or direct construction could have set.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.candidate_queue == 0 || self.result_queue == 0 {
            return Err("queue capacities must be at least 1".to_string());
        }
        Ok(())
    }

    /// True when unreadable entries abort the scan.
    pub fn is_strict(&self) -> bool {
        self.entry_errors == EntryErrorPolicy::FailFast
    }
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            candidate_queue: 1000,
            result_queue: 100,
            entry_errors: EntryErrorPolicy::Skip,
            follow_symlinks: false,
            max_depth: None,
            sort_results: true,
            progress_interval: 1000,
        }
    }
}
