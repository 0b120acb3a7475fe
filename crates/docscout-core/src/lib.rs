//! Core types and filters for docscout.
//!
//! This crate provides the data model shared by the discovery engine and its
//! callers: filter rules, candidate and document records, configuration,
//! and the error taxonomy.

mod config;
mod document;
mod error;
mod filter;
mod report;

pub use config::{DiscoverConfig, DiscoverConfigBuilder, EntryErrorPolicy};
pub use document::{Candidate, DirEntryInfo, Document};
pub use error::{CancelReason, DiscoverError, EntryWarning, WarningKind};
pub use filter::{FilterMatcher, FilterSpec, FilterSpecBuilder, matches_pattern, normalize_extension};
pub use report::{DiscoverStats, DiscoveryReport};
