//! Engine Module
//!
//! The contract the harness drives. The storage engine itself is a black
//! box; only these operations are used.
//!
//! ## Lifecycle
//! ```text
//! open ──► set* ──► delete* ──► reclaim_value_log* ──► close
//! ```
//! Every `set` and `delete` is its own atomic transaction. An instance is
//! owned by exactly one scenario task and never used concurrently.

mod sled;

pub use self::sled::{SledConfig, SledEngine, SledMode};

use std::fmt::Debug;
use std::path::Path;

use crate::artifacts::ArtifactLayout;
use crate::error::EngineError;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Outcome of one value-log reclamation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reclaim {
    /// The pass rewrote or released data; another pass may help
    Rewritten { bytes: u64 },

    /// Nothing left to rewrite; stop calling
    NothingToRewrite,
}

/// Transactional key-value engine under test
pub trait Engine: Sized {
    /// Tuning knobs
    type Config: Debug + Clone + Default + Send + Sync + 'static;

    /// Short engine name for logs
    const NAME: &'static str;

    /// Open (or create) an instance in `path`
    fn open(path: &Path, config: &Self::Config) -> EngineResult<Self>;

    /// Set `key` to `value` in its own transaction
    fn set(&self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Delete `key` in its own transaction
    fn delete(&self, key: &[u8]) -> EngineResult<()>;

    /// Run one value-log reclamation pass with the given threshold
    fn reclaim_value_log(&self, ratio: f64) -> EngineResult<Reclaim>;

    /// Flush and release the instance, including its directory lock
    ///
    /// Returns only once the directory can be opened again.
    fn close(self) -> EngineResult<()>;

    /// Configuration used to reopen a directory after a scenario
    ///
    /// Defaults to `Config::default()`. Engines that persist some knobs in
    /// the directory carry those over from `config`.
    fn baseline(_config: &Self::Config) -> Self::Config {
        Self::Config::default()
    }

    /// How this engine names the files the scanner accounts for
    fn artifact_layout() -> ArtifactLayout;
}
