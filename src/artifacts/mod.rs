//! Artifacts Module
//!
//! Post-run accounting of the files an engine left on disk.
//!
//! ## Responsibilities
//! - Classify files into two tracked classes (tables, value logs)
//! - Walk a closed engine's directory recursively
//! - Sum file counts and per-file sizes truncated to whole KiB
//!
//! A scan is all-or-nothing: any traversal error discards the result.

mod layout;
mod metrics;
mod scanner;

pub use layout::{ArtifactClass, ArtifactLayout, ArtifactRule};
pub use metrics::{ClassTotals, Metrics};
pub use scanner::scan;
