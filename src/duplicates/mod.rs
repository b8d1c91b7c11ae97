//! Duplicate detection module.
//!
//! This module provides:
//! - Size and hash group views over the catalog ([`groups`])
//! - The four-phase scan pipeline ([`finder`])

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanPhase, ScanSummary, ScanWarning};
pub use groups::{GroupingStats, HashGroup, SizeGroup};
