//! Scenario Scheduler
//!
//! Runs every scenario on its own thread and collects the outcomes.
//!
//! ## Flow
//! ```text
//!  scenario 0 ──► [temp dir ─► runner ─► scan ─► remove] ──┐
//!  scenario 1 ──► [temp dir ─► runner ─► scan ─► remove] ──┼──► channel ──► slots[index]
//!  scenario n ──► [temp dir ─► runner ─► scan ─► remove] ──┘
//! ```
//! Completion order is arbitrary; outcomes are returned in submission
//! order. A fatal error short-circuits without waiting for the others.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel;
use tempfile::TempDir;

use crate::artifacts::{self, Metrics};
use crate::config::{HarnessConfig, TEMP_DIR_PREFIX};
use crate::engine::Engine;
use crate::error::{HarnessError, Result};
use crate::runner::{RunSummary, ScenarioRunner};
use crate::scenario::{self, Scenario};

/// Result of one successful scenario
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub metrics: Metrics,
    pub summary: RunSummary,

    /// Scratch directory the scenario ran in (already removed)
    pub directory: PathBuf,

    pub elapsed: Duration,
}

/// Per-scenario outcome, in submission order
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<ScenarioReport>,
}

impl ScenarioOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs scenarios concurrently against one engine type
pub struct Scheduler {
    config: HarnessConfig,
}

impl Scheduler {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run all scenarios and wait for them
    ///
    /// Returns `Err` only for invalid input, a failed thread spawn, or a
    /// fatal scenario error. In the fatal case the remaining threads are
    /// left running and the caller is expected to exit the process.
    pub fn run<E>(&self, scenarios: Vec<Scenario<E::Config>>) -> Result<Vec<ScenarioOutcome>>
    where
        E: Engine + 'static,
    {
        scenario::validate(&scenarios)?;

        let scenarios: Arc<[Scenario<E::Config>]> = scenarios.into();
        let (tx, rx) = channel::unbounded::<(usize, Result<ScenarioReport>)>();

        tracing::info!(count = scenarios.len(), engine = E::NAME, "launching scenarios");

        let mut handles = Vec::with_capacity(scenarios.len());
        for index in 0..scenarios.len() {
            let scenarios = Arc::clone(&scenarios);
            let config = self.config.clone();
            let tx = tx.clone();

            let handle = thread::Builder::new()
                .name(format!("scenario-{}", index))
                .spawn(move || {
                    let result = run_scenario::<E>(&scenarios[index], &config);
                    // The receiver is gone once a fatal error was reported
                    let _ = tx.send((index, result));
                })
                .map_err(HarnessError::Spawn)?;
            handles.push(handle);
        }
        drop(tx);

        let mut slots: Vec<Option<Result<ScenarioReport>>> =
            (0..scenarios.len()).map(|_| None).collect();

        for (index, result) in rx.iter() {
            match result {
                Err(err) if err.is_fatal() => {
                    tracing::error!(scenario = %scenarios[index].name, error = %err, "fatal scenario error");
                    return Err(err);
                }
                other => slots[index] = Some(other),
            }
        }

        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(payload) = handle.join() {
                let message = panic_message(payload);
                tracing::error!(scenario = %scenarios[index].name, %message, "scenario thread panicked");
                slots[index].get_or_insert(Err(HarnessError::TaskPanicked(message)));
            }
        }

        Ok(scenarios
            .iter()
            .zip(slots)
            .map(|(scenario, slot)| ScenarioOutcome {
                name: scenario.name.clone(),
                result: slot.unwrap_or_else(|| {
                    Err(HarnessError::TaskPanicked("no result reported".to_string()))
                }),
            })
            .collect())
    }
}

/// One scenario end to end: provision, run, scan, remove
fn run_scenario<E: Engine>(scenario: &Scenario<E::Config>, config: &HarnessConfig) -> Result<ScenarioReport> {
    let span = tracing::info_span!("scenario", name = %scenario.name);
    let _enter = span.enter();

    let started = Instant::now();
    let dir = provision_dir(config)?;
    let directory = dir.path().to_path_buf();

    tracing::info!(
        dir = %directory.display(),
        items = scenario.workload.num_items,
        value_size = scenario.workload.value_size,
        "scenario started"
    );

    let result = ScenarioRunner::<E>::new(&directory, scenario, config)
        .run()
        .and_then(|summary| {
            let metrics = artifacts::scan(&directory, &E::artifact_layout())?;
            Ok((summary, metrics))
        });

    if let Err(e) = dir.close() {
        tracing::warn!(dir = %directory.display(), error = %e, "failed to remove scenario directory");
    }

    let (summary, metrics) = result?;
    let elapsed = started.elapsed();
    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, %metrics, "scenario finished");

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        metrics,
        summary,
        directory,
        elapsed,
    })
}

fn provision_dir(config: &HarnessConfig) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_DIR_PREFIX);

    let dir = match &config.temp_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    };
    dir.map_err(HarnessError::TempDir)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
