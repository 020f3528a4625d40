//! Tests for the Scenario Scheduler
//!
//! These tests verify:
//! - Concurrent scenarios get distinct directories, all removed afterwards
//! - Outcomes come back in submission order
//! - One failing scenario yields no metrics for that scenario
//! - Fatal close failures short-circuit the run

mod common;

use std::collections::HashSet;

use common::{Faults, MemoryConfig, MemoryEngine};
use kvbench::artifacts::ClassTotals;
use kvbench::{ClosePolicy, HarnessConfig, HarnessError, Scenario, Scheduler};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn scheduler_in(root: &TempDir) -> Scheduler {
    Scheduler::new(HarnessConfig::builder().temp_root(root.path()).build().unwrap())
}

fn healthy(n: usize) -> Vec<Scenario<MemoryConfig>> {
    (0..n)
        .map(|i| common::memory_scenario(&format!("scenario-{}", i), MemoryConfig::default()))
        .collect()
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_distinct_directories_all_removed() {
    let root = TempDir::new().unwrap();
    let outcomes = scheduler_in(&root).run::<MemoryEngine>(healthy(6)).unwrap();

    assert_eq!(outcomes.len(), 6);
    let mut dirs = HashSet::new();
    for outcome in &outcomes {
        let report = outcome.result.as_ref().unwrap();
        assert!(report.directory.starts_with(root.path()));
        assert!(!report.directory.exists(), "{} not removed", report.directory.display());
        assert!(dirs.insert(report.directory.clone()));
    }

    // Nothing left behind under the root
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn test_outcomes_in_submission_order() {
    let root = TempDir::new().unwrap();
    let scenarios = healthy(8);
    let names: Vec<String> = scenarios.iter().map(|s| s.name.clone()).collect();

    let outcomes = scheduler_in(&root).run::<MemoryEngine>(scenarios).unwrap();
    let got: Vec<String> = outcomes.iter().map(|o| o.name.clone()).collect();
    assert_eq!(got, names);
}

#[test]
fn test_metrics_reflect_engine_files() {
    let root = TempDir::new().unwrap();
    let outcomes = scheduler_in(&root).run::<MemoryEngine>(healthy(1)).unwrap();
    let report = outcomes[0].result.as_ref().unwrap();

    // 4096-byte table; 100 values of 256 bytes in the value log
    assert_eq!(report.metrics.tables, ClassTotals { files: 1, size_kib: 4 });
    assert_eq!(report.metrics.value_logs, ClassTotals { files: 1, size_kib: 25 });
    assert_eq!(report.summary.inserted, 100);
    assert_eq!(report.summary.deleted, 100);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_put_failure_has_no_metrics() {
    let root = TempDir::new().unwrap();
    let mut scenarios = healthy(3);
    scenarios[1].engine = MemoryConfig::with_faults(Faults {
        fail_put_at: Some(10),
        ..Faults::default()
    });

    let outcomes = scheduler_in(&root).run::<MemoryEngine>(scenarios).unwrap();

    assert!(outcomes[0].is_success());
    assert!(outcomes[2].is_success());
    assert!(!outcomes[1].is_success());
    match &outcomes[1].result {
        Err(HarnessError::Put { index: 10, .. }) => {}
        other => panic!("unexpected outcome: {:?}", other),
    }

    // The failed scenario's directory is gone too
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn test_fatal_close_short_circuits() {
    let root = TempDir::new().unwrap();
    let mut scenarios = healthy(2);
    scenarios[0].engine = MemoryConfig::with_faults(Faults {
        fail_close: true,
        ..Faults::default()
    });

    let err = scheduler_in(&root).run::<MemoryEngine>(scenarios).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_close_failure_propagates_when_configured() {
    let root = TempDir::new().unwrap();
    let mut scenarios = healthy(2);
    scenarios[0].engine = MemoryConfig::with_faults(Faults {
        fail_close: true,
        ..Faults::default()
    });

    let config = HarnessConfig::builder()
        .temp_root(root.path())
        .close_policy(ClosePolicy::Propagate)
        .build()
        .unwrap();
    let outcomes = Scheduler::new(config).run::<MemoryEngine>(scenarios).unwrap();

    assert!(matches!(outcomes[0].result, Err(HarnessError::Close { .. })));
    assert!(outcomes[1].is_success());
}

#[test]
fn test_missing_temp_root() {
    let root = TempDir::new().unwrap();
    let config = HarnessConfig::builder()
        .temp_root(root.path().join("does-not-exist"))
        .build()
        .unwrap();

    let outcomes = Scheduler::new(config).run::<MemoryEngine>(healthy(1)).unwrap();
    assert!(matches!(outcomes[0].result, Err(HarnessError::TempDir(_))));
}

#[test]
fn test_invalid_scenario_lists() {
    let root = TempDir::new().unwrap();
    let scheduler = scheduler_in(&root);

    assert!(matches!(
        scheduler.run::<MemoryEngine>(Vec::new()),
        Err(HarnessError::Config(_))
    ));

    let mut dupes = healthy(2);
    dupes[1].name = dupes[0].name.clone();
    assert!(matches!(
        scheduler.run::<MemoryEngine>(dupes),
        Err(HarnessError::Config(_))
    ));
}
