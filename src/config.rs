//! Configuration for kvbench
//!
//! Harness-level settings with sensible defaults. Engine tuning knobs live
//! with each [`Scenario`](crate::scenario::Scenario), not here.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{HarnessError, Result};

/// Ratio handed to the engine's value-log reclamation on every pass
pub const DEFAULT_RECLAIM_RATIO: f64 = 0.01;

/// Prefix for every per-scenario temporary directory
pub const TEMP_DIR_PREFIX: &str = "kvbench-";

/// Main configuration for a benchmark run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    // -------------------------------------------------------------------------
    // Filesystem Configuration
    // -------------------------------------------------------------------------
    /// Parent directory for scenario scratch directories.
    /// `None` uses the system temp directory.
    pub temp_root: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Cleanup Configuration
    // -------------------------------------------------------------------------
    /// Threshold passed to each value-log reclamation pass
    pub reclaim_ratio: f64,

    /// What a failed engine close does to the rest of the run
    pub close_policy: ClosePolicy,
}

/// How a failure to close an engine is escalated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosePolicy {
    /// Stop the whole benchmark immediately (exit code 2)
    #[default]
    Abort,

    /// Treat it like any other scenario failure
    Propagate,
}

impl fmt::Display for ClosePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosePolicy::Abort => f.write_str("abort"),
            ClosePolicy::Propagate => f.write_str("propagate"),
        }
    }
}

impl FromStr for ClosePolicy {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(ClosePolicy::Abort),
            "propagate" => Ok(ClosePolicy::Propagate),
            other => Err(HarnessError::Config(format!(
                "unknown close policy '{}' (expected 'abort' or 'propagate')",
                other
            ))),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            reclaim_ratio: DEFAULT_RECLAIM_RATIO,
            close_policy: ClosePolicy::Abort,
        }
    }
}

impl HarnessConfig {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for HarnessConfig
#[derive(Default)]
pub struct ConfigBuilder {
    config: HarnessConfig,
}

impl ConfigBuilder {
    /// Put scenario directories under `path` instead of the system temp dir
    pub fn temp_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.temp_root = Some(path.into());
        self
    }

    /// Set the value-log reclamation ratio
    pub fn reclaim_ratio(mut self, ratio: f64) -> Self {
        self.config.reclaim_ratio = ratio;
        self
    }

    /// Set the close-failure policy
    pub fn close_policy(mut self, policy: ClosePolicy) -> Self {
        self.config.close_policy = policy;
        self
    }

    /// Validate and return the config
    ///
    /// The ratio must lie in `(0.0, 1.0)`.
    pub fn build(self) -> Result<HarnessConfig> {
        let ratio = self.config.reclaim_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(HarnessError::Config(format!(
                "reclaim ratio must be in (0, 1), got {}",
                ratio
            )));
        }
        Ok(self.config)
    }
}
