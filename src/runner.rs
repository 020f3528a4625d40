//! Scenario Runner
//!
//! Owns one engine instance for the whole of one scenario.
//!
//! ## Stages
//! ```text
//! Created ─► Opened ─► Populating ─► Deleting ─► Reclaiming ─► Closed ─► Verified
//!    │          │           │            │            │            │
//!    └──────────┴───────────┴────────────┴────────────┴────────────┴──► Failed
//! ```
//! Once the engine is open, cleanup (reclaim, close, reopen-and-close) runs
//! on every exit path.

use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use crate::config::HarnessConfig;
use crate::engine::{Engine, Reclaim};
use crate::error::{HarnessError, Result};
use crate::scenario::Scenario;
use crate::workload::WorkloadGenerator;

/// Lifecycle stage of a scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    Opened,
    Populating,
    Deleting,
    Reclaiming,
    Closed,
    Verified,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a successful run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub inserted: usize,
    pub deleted: usize,

    /// Reclamation passes that rewrote something before the sentinel
    pub reclaim_passes: usize,

    /// Bytes reported by those passes
    pub reclaimed_bytes: u64,
}

/// Drives one scenario against engine `E` in one directory
pub struct ScenarioRunner<'a, E: Engine> {
    path: &'a Path,
    scenario: &'a Scenario<E::Config>,
    config: &'a HarnessConfig,
    stage: Stage,
    summary: RunSummary,
    engine: PhantomData<fn() -> E>,
}

impl<'a, E: Engine> ScenarioRunner<'a, E> {
    /// `path` must be an existing, empty, writable directory
    pub fn new(path: &'a Path, scenario: &'a Scenario<E::Config>, config: &'a HarnessConfig) -> Self {
        Self {
            path,
            scenario,
            config,
            stage: Stage::Created,
            summary: RunSummary::default(),
            engine: PhantomData,
        }
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run the scenario to a terminal stage
    ///
    /// Succeeds only if open, the full workload, and every cleanup step
    /// succeeded. When several steps fail, the most severe error wins:
    /// close, then workload, then reclamation, then reopen.
    pub fn run(&mut self) -> Result<RunSummary> {
        let engine = match self.open() {
            Ok(engine) => engine,
            Err(err) => {
                self.advance(Stage::Failed);
                return Err(err);
            }
        };

        let mut errors = Vec::new();

        if let Err(err) = self.drive(&engine) {
            errors.push(err);
        }
        self.cleanup(engine, &mut errors);

        match pick_most_severe(errors) {
            None => {
                self.advance(Stage::Verified);
                Ok(self.summary)
            }
            Some(err) => {
                self.advance(Stage::Failed);
                Err(err)
            }
        }
    }

    fn advance(&mut self, next: Stage) {
        tracing::debug!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }

    fn open(&mut self) -> Result<E> {
        self.scenario.workload.validate()?;
        check_empty_dir(self.path)?;
        let engine = E::open(self.path, &self.scenario.engine).map_err(HarnessError::Open)?;
        self.advance(Stage::Opened);
        Ok(engine)
    }

    /// Insert every generated record, then delete every key in generation order
    fn drive(&mut self, engine: &E) -> Result<()> {
        let spec = self.scenario.workload;
        let progress_step = (spec.num_items / 10).max(1);
        let mut generator = WorkloadGenerator::new(spec);

        // Keys packed back to back, `key_size` bytes each
        let mut keys = Vec::with_capacity(spec.num_items * spec.key_size);

        self.advance(Stage::Populating);
        while let Some(record) = generator.next_record()? {
            engine
                .set(&record.key, record.value)
                .map_err(|source| HarnessError::Put {
                    index: record.index,
                    source,
                })?;
            keys.extend_from_slice(&record.key);
            self.summary.inserted += 1;

            if self.summary.inserted % progress_step == 0 {
                tracing::debug!(inserted = self.summary.inserted, total = spec.num_items, "populating");
            }
        }

        self.advance(Stage::Deleting);
        for (index, key) in keys.chunks_exact(spec.key_size).enumerate() {
            engine
                .delete(key)
                .map_err(|source| HarnessError::Delete { index, source })?;
            self.summary.deleted += 1;

            if self.summary.deleted % progress_step == 0 {
                tracing::debug!(deleted = self.summary.deleted, total = spec.num_items, "deleting");
            }
        }

        Ok(())
    }

    /// Reclaim until the sentinel, close, then reopen with the engine's
    /// baseline config and close again so deferred recovery work lands on disk
    /// before the directory is scanned.
    fn cleanup(&mut self, engine: E, errors: &mut Vec<HarnessError>) {
        self.advance(Stage::Reclaiming);
        if let Err(err) = self.reclaim(&engine) {
            errors.push(err);
        }

        if let Err(source) = engine.close() {
            errors.push(self.close_error(source));
            return;
        }
        self.advance(Stage::Closed);

        let baseline = E::baseline(&self.scenario.engine);
        match E::open(self.path, &baseline) {
            Ok(reopened) => {
                if let Err(source) = reopened.close() {
                    errors.push(self.close_error(source));
                }
            }
            Err(source) => errors.push(HarnessError::Open(source)),
        }
    }

    fn reclaim(&mut self, engine: &E) -> Result<()> {
        loop {
            match engine.reclaim_value_log(self.config.reclaim_ratio) {
                Ok(Reclaim::Rewritten { bytes }) => {
                    self.summary.reclaim_passes += 1;
                    self.summary.reclaimed_bytes += bytes;
                    tracing::debug!(pass = self.summary.reclaim_passes, bytes, "value log rewritten");
                }
                Ok(Reclaim::NothingToRewrite) => return Ok(()),
                Err(source) => return Err(HarnessError::Reclaim(source)),
            }
        }
    }

    fn close_error(&self, source: crate::error::EngineError) -> HarnessError {
        HarnessError::Close {
            source,
            policy: self.config.close_policy,
        }
    }
}

fn check_empty_dir(path: &Path) -> Result<()> {
    let invalid = |reason: String| HarnessError::InvalidDirectory {
        path: path.to_path_buf(),
        reason,
    };

    let mut entries = fs::read_dir(path).map_err(|e| invalid(e.to_string()))?;
    if entries.next().is_some() {
        return Err(invalid("directory is not empty".to_string()));
    }
    Ok(())
}

/// Lower is more severe
fn severity(err: &HarnessError) -> u8 {
    match err {
        HarnessError::Close { .. } => 0,
        HarnessError::Generator(_) | HarnessError::Put { .. } | HarnessError::Delete { .. } => 1,
        HarnessError::Reclaim(_) => 2,
        _ => 3,
    }
}

fn pick_most_severe(errors: Vec<HarnessError>) -> Option<HarnessError> {
    let mut errors = errors.into_iter();
    let mut worst = errors.next()?;
    for err in errors {
        if severity(&err) < severity(&worst) {
            tracing::warn!(error = %worst, "additional scenario error");
            worst = err;
        } else {
            tracing::warn!(error = %err, "additional scenario error");
        }
    }
    Some(worst)
}
