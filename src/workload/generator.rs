//! Workload Generator
//!
//! Seeded producer of fixed-size keys and values.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{HarnessError, Result};

/// Seed shared by every scenario so configurations see identical data
pub const DEFAULT_SEED: u64 = 22;

/// Shape of a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadSpec {
    /// Number of records written (and later deleted)
    pub num_items: usize,

    /// Length of every key in bytes
    pub key_size: usize,

    /// Length of every value in bytes
    pub value_size: usize,

    /// Seed for the random stream
    pub seed: u64,
}

impl WorkloadSpec {
    /// Key length used by every built-in variant
    pub const KEY_SIZE: usize = 16;

    pub fn new(num_items: usize, key_size: usize, value_size: usize) -> Self {
        Self {
            num_items,
            key_size,
            value_size,
            seed: DEFAULT_SEED,
        }
    }

    /// 1,000,000 records of 16-byte keys and 1 KiB values
    pub fn small_values() -> Self {
        Self::new(1_000_000, Self::KEY_SIZE, 1024)
    }

    /// 100,000 records of 16-byte keys and 10 KiB values
    pub fn large_values() -> Self {
        Self::new(100_000, Self::KEY_SIZE, 10 * 1024)
    }

    /// Same shape, different seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Same shape, different item count
    pub fn with_items(mut self, num_items: usize) -> Self {
        self.num_items = num_items;
        self
    }

    /// Logical bytes written by the whole workload (keys + values)
    pub fn logical_bytes(&self) -> u64 {
        (self.num_items as u64) * (self.key_size + self.value_size) as u64
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.key_size == 0 {
            return Err(HarnessError::Config("key size must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// One generated record
///
/// The value borrows the generator's buffer and is overwritten by the next
/// call to [`WorkloadGenerator::next_record`].
#[derive(Debug)]
pub struct Record<'a> {
    /// Position in the stream, starting at zero
    pub index: usize,
    pub key: Vec<u8>,
    pub value: &'a [u8],
}

/// Deterministic key/value producer
///
/// Consumed sequentially by a single caller. Generic over the random source
/// so a failing source can be substituted.
pub struct WorkloadGenerator<R = ChaCha8Rng> {
    rng: R,
    spec: WorkloadSpec,
    produced: usize,
    value: Vec<u8>,
}

impl WorkloadGenerator<ChaCha8Rng> {
    /// Create a generator seeded from `spec.seed`
    pub fn new(spec: WorkloadSpec) -> Self {
        Self::with_rng(spec, ChaCha8Rng::seed_from_u64(spec.seed))
    }
}

impl<R: RngCore> WorkloadGenerator<R> {
    /// Create a generator over an arbitrary random source
    pub fn with_rng(spec: WorkloadSpec, rng: R) -> Self {
        Self {
            rng,
            spec,
            produced: 0,
            value: vec![0u8; spec.value_size],
        }
    }

    /// Produce the next record, or `None` once `num_items` have been produced
    ///
    /// The key is drawn first, then the value, both from the same stream.
    pub fn next_record(&mut self) -> Result<Option<Record<'_>>> {
        if self.produced >= self.spec.num_items {
            return Ok(None);
        }

        let mut key = vec![0u8; self.spec.key_size];
        self.rng.try_fill_bytes(&mut key)?;
        self.rng.try_fill_bytes(&mut self.value)?;

        let index = self.produced;
        self.produced += 1;

        Ok(Some(Record {
            index,
            key,
            value: &self.value,
        }))
    }

    /// Records produced so far
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Records still to come
    pub fn remaining(&self) -> usize {
        self.spec.num_items - self.produced
    }

    pub fn spec(&self) -> &WorkloadSpec {
        &self.spec
    }
}
