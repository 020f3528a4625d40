//! Workload Module
//!
//! Deterministic key/value stream used to populate and then empty an engine.
//!
//! ## Responsibilities
//! - Describe the shape of a workload (item count, key and value sizes)
//! - Produce the same byte stream for the same seed, on every platform
//! - Surface random-source failures instead of panicking
//!
//! ## Stream Layout
//! ```text
//! seed ──► ChaCha8 ──► [key 0][value 0][key 1][value 1] ... [key n-1][value n-1]
//! ```
//! Keys are kept for the delete phase; the value buffer is reused.

mod generator;

pub use generator::{Record, WorkloadGenerator, WorkloadSpec, DEFAULT_SEED};
