//! # kvbench
//!
//! A reproducible on-disk footprint benchmark for embedded key-value engines:
//! - Deterministic, seeded workload (write every key, then delete every key)
//! - Full engine lifecycle per scenario, with value-log reclamation and a
//!   verifying reopen before measurement
//! - Concurrent, isolated scenarios
//! - Per-class accounting of the files left on disk
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Scheduler                            │
//! │               (one thread per scenario)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Scenario Runner                           │
//! │   open → populate → delete → reclaim → close → reopen        │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │    Workload     │                │     Engine      │
//!   │   (ChaCha8)     │                │  (sled, trait)  │
//!   └─────────────────┘                └────────┬────────┘
//!                                               │ directory
//!                                               ▼
//!                                      ┌─────────────────┐
//!                                      │    Artifact     │
//!                                      │    Scanner      │
//!                                      └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod workload;
pub mod engine;
pub mod artifacts;
pub mod runner;
pub mod scenario;
pub mod scheduler;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HarnessError, Result};
pub use config::{ClosePolicy, HarnessConfig};
pub use engine::{Engine, Reclaim};
pub use artifacts::Metrics;
pub use scenario::Scenario;
pub use scheduler::Scheduler;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvbench
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
