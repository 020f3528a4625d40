//! Scenarios
//!
//! A scenario is a named engine configuration plus the workload to run
//! against it. The built-in catalogue is fixed at compile time.

use std::collections::HashSet;

use crate::engine::{SledConfig, SledMode};
use crate::error::{HarnessError, Result};
use crate::workload::WorkloadSpec;

/// One named configuration exercised by the harness
#[derive(Debug, Clone)]
pub struct Scenario<C> {
    pub name: String,
    pub engine: C,
    pub workload: WorkloadSpec,
}

impl<C> Scenario<C> {
    pub fn new(name: impl Into<String>, engine: C, workload: WorkloadSpec) -> Self {
        Self {
            name: name.into(),
            engine,
            workload,
        }
    }
}

/// The built-in sled scenarios, in reporting order
pub fn builtin() -> Vec<Scenario<SledConfig>> {
    vec![
        // Space-first tuning, expressed in sled terms:
        // - keep no old versions: sled never retains superseded values, and
        //   LowSpace makes its cleaner relocate live pages eagerly
        // - compact on close: frequent flushes plus the flush in `close` and
        //   the baseline reopen leave no dirty state behind
        // - fixed log file size: `segment_size`. Segments live inside `db`
        //   and are capped at 16 MiB, so a 20 MiB log file has no direct
        //   equivalent; 1 MiB keeps 1 KiB values inline and gives the cleaner
        //   small units to free
        Scenario::new(
            "Aggressive",
            SledConfig {
                cache_capacity: 64 * 1024 * 1024,
                segment_size: 1024 * 1024,
                mode: SledMode::LowSpace,
                flush_every_ms: Some(100),
            },
            WorkloadSpec::small_values(),
        ),
        Scenario::new("Baseline", SledConfig::default(), WorkloadSpec::small_values()),
        Scenario::new(
            "LargeValues",
            SledConfig {
                // 32 KiB segments push 10 KiB values out-of-line into blobs/
                segment_size: 32 * 1024,
                mode: SledMode::HighThroughput,
                ..SledConfig::default()
            },
            WorkloadSpec::large_values(),
        ),
    ]
}

/// Keep only the scenarios named in `names`, preserving catalogue order
///
/// An empty `names` keeps everything. Unknown names are an error.
pub fn select<C>(scenarios: Vec<Scenario<C>>, names: &[String]) -> Result<Vec<Scenario<C>>> {
    if names.is_empty() {
        return Ok(scenarios);
    }

    for name in names {
        if !scenarios.iter().any(|s| &s.name == name) {
            return Err(HarnessError::Config(format!("unknown scenario '{}'", name)));
        }
    }

    Ok(scenarios
        .into_iter()
        .filter(|s| names.contains(&s.name))
        .collect())
}

/// Reject empty scenario lists, duplicate names and degenerate workloads
pub fn validate<C>(scenarios: &[Scenario<C>]) -> Result<()> {
    if scenarios.is_empty() {
        return Err(HarnessError::Config("no scenarios to run".to_string()));
    }

    let mut seen = HashSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.name.as_str()) {
            return Err(HarnessError::Config(format!(
                "duplicate scenario name '{}'",
                scenario.name
            )));
        }
        scenario.workload.validate()?;
    }
    Ok(())
}
