//! Error types for kvbench
//!
//! Provides a unified error type for every stage of a benchmark run.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ClosePolicy;

/// Result type alias using HarnessError
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Boxed error coming out of an engine implementation
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for harness operations
#[derive(Debug, Error)]
pub enum HarnessError {
    // -------------------------------------------------------------------------
    // Setup Errors
    // -------------------------------------------------------------------------
    #[error("creating temp dir: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("invalid scenario directory {}: {reason}", path.display())]
    InvalidDirectory { path: PathBuf, reason: String },

    #[error("creating datastore: {0}")]
    Open(EngineError),

    #[error("spawning scenario thread: {0}")]
    Spawn(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Workload Errors
    // -------------------------------------------------------------------------
    #[error("generating workload: {0}")]
    Generator(#[from] rand::Error),

    #[error("put operation (item {index}): {source}")]
    Put { index: usize, source: EngineError },

    #[error("delete (item {index}): {source}")]
    Delete { index: usize, source: EngineError },

    // -------------------------------------------------------------------------
    // Cleanup Errors
    // -------------------------------------------------------------------------
    #[error("reclaiming value log: {0}")]
    Reclaim(EngineError),

    #[error("closing datastore: {source}")]
    Close {
        source: EngineError,
        policy: ClosePolicy,
    },

    // -------------------------------------------------------------------------
    // Scan Errors
    // -------------------------------------------------------------------------
    #[error("scanning artifacts at {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Configuration / Scheduling Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("scenario task panicked: {0}")]
    TaskPanicked(String),
}

impl HarnessError {
    /// Whether this error must stop the whole benchmark immediately
    ///
    /// Only a close failure under [`ClosePolicy::Abort`] qualifies: the
    /// engine may still hold its directory lock.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::Close {
                policy: ClosePolicy::Abort,
                ..
            }
        )
    }
}
