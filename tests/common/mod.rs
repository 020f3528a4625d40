//! Shared test helpers: an in-memory engine with fault injection.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kvbench::artifacts::{ArtifactLayout, ArtifactRule};
use kvbench::engine::{EngineResult, Reclaim};
use kvbench::workload::WorkloadSpec;
use kvbench::{Engine, Scenario};
use parking_lot::Mutex;

pub const LOCK_FILE: &str = "LOCK";
pub const OPEN_LOG: &str = "opens.log";
pub const CONF_FILE: &str = "conf";
pub const TABLE_FILE: &str = "000001.sst";
pub const VALUE_LOG_FILE: &str = "000001.vlog";

/// One engine call, as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open,
    Set(Vec<u8>),
    Delete(Vec<u8>),
    Reclaim(u64),
    Close,
}

/// Which calls fail
#[derive(Debug, Clone, Default)]
pub struct Faults {
    pub fail_open: bool,
    /// Zero-based index of the set that fails
    pub fail_put_at: Option<usize>,
    /// Zero-based index of the delete that fails
    pub fail_delete_at: Option<usize>,
    pub fail_reclaim: bool,
    pub fail_close: bool,
}

/// Config for [`MemoryEngine`]; the journal is shared with the test
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    pub faults: Faults,
    /// Passes that report `Rewritten` before the sentinel
    pub reclaim_passes: usize,
    /// Persisted on first open; a reopen with another value fails
    pub segment_size: usize,
    pub journal: Arc<Mutex<Vec<Event>>>,
}

impl MemoryConfig {
    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.lock().clone()
    }

    pub fn set_keys(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Set(k) => Some(k),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_keys(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Delete(k) => Some(k),
                _ => None,
            })
            .collect()
    }
}

#[derive(Default)]
struct State {
    live: BTreeMap<Vec<u8>, usize>,
    sets: usize,
    deletes: usize,
    reclaims: usize,
    value_log_bytes: usize,
    dirty: bool,
}

/// Engine that keeps data in memory and writes a `.sst` and a `.vlog`
/// file on close
pub struct MemoryEngine {
    path: PathBuf,
    config: MemoryConfig,
    state: Mutex<State>,
}

impl MemoryEngine {
    fn record(&self, event: Event) {
        self.config.journal.lock().push(event);
    }
}

impl Engine for MemoryEngine {
    type Config = MemoryConfig;

    const NAME: &'static str = "memory";

    fn open(path: &Path, config: &MemoryConfig) -> EngineResult<Self> {
        if config.faults.fail_open {
            return Err("injected open failure".into());
        }
        let lock = path.join(LOCK_FILE);
        if lock.exists() {
            return Err("directory is locked".into());
        }
        let conf = path.join(CONF_FILE);
        if conf.exists() {
            let stored: usize = fs::read_to_string(&conf)?.trim().parse()?;
            if stored != config.segment_size {
                return Err(format!("cannot change segment size across restarts (stored {})", stored).into());
            }
        } else {
            fs::write(&conf, config.segment_size.to_string())?;
        }
        fs::write(&lock, b"")?;

        let mut log = OpenOptions::new().create(true).append(true).open(path.join(OPEN_LOG))?;
        writeln!(log, "open")?;

        let engine = Self {
            path: path.to_path_buf(),
            config: config.clone(),
            state: Mutex::new(State::default()),
        };
        engine.record(Event::Open);
        Ok(engine)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut state = self.state.lock();
        if self.config.faults.fail_put_at == Some(state.sets) {
            return Err("injected put failure".into());
        }
        state.sets += 1;
        state.live.insert(key.to_vec(), value.len());
        state.value_log_bytes += value.len();
        state.dirty = true;
        drop(state);

        self.record(Event::Set(key.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> EngineResult<()> {
        let mut state = self.state.lock();
        if self.config.faults.fail_delete_at == Some(state.deletes) {
            return Err("injected delete failure".into());
        }
        state.deletes += 1;
        state.live.remove(key);
        state.dirty = true;
        drop(state);

        self.record(Event::Delete(key.to_vec()));
        Ok(())
    }

    fn reclaim_value_log(&self, _ratio: f64) -> EngineResult<Reclaim> {
        if self.config.faults.fail_reclaim {
            return Err("injected reclaim failure".into());
        }
        let mut state = self.state.lock();
        if state.reclaims >= self.config.reclaim_passes {
            return Ok(Reclaim::NothingToRewrite);
        }
        state.reclaims += 1;
        let bytes = 1024;
        drop(state);

        self.record(Event::Reclaim(bytes));
        Ok(Reclaim::Rewritten { bytes })
    }

    fn close(self) -> EngineResult<()> {
        if self.config.faults.fail_close {
            return Err("injected close failure".into());
        }
        let state = self.state.into_inner();
        if state.dirty {
            let table_bytes: usize = state.live.keys().map(|k| k.len() + 8).sum::<usize>() + 4096;
            fs::write(self.path.join(TABLE_FILE), vec![0u8; table_bytes])?;
            fs::write(self.path.join(VALUE_LOG_FILE), vec![0u8; state.value_log_bytes])?;
        }
        fs::remove_file(self.path.join(LOCK_FILE))?;
        self.config.journal.lock().push(Event::Close);
        Ok(())
    }

    fn baseline(config: &MemoryConfig) -> MemoryConfig {
        MemoryConfig {
            segment_size: config.segment_size,
            ..MemoryConfig::default()
        }
    }

    fn artifact_layout() -> ArtifactLayout {
        ArtifactLayout::new(
            vec![ArtifactRule::Extension("sst")],
            vec![ArtifactRule::Extension("vlog")],
        )
    }
}

/// A small workload that runs in milliseconds
pub fn tiny_workload() -> WorkloadSpec {
    WorkloadSpec::new(100, 16, 256)
}

pub fn memory_scenario(name: &str, config: MemoryConfig) -> Scenario<MemoryConfig> {
    Scenario::new(name, config, tiny_workload())
}

/// Number of times an engine was opened in `dir`
pub fn open_count(dir: &Path) -> usize {
    fs::read_to_string(dir.join(OPEN_LOG))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}
