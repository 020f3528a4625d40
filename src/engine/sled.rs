//! Sled Engine
//!
//! Adapter that drives `sled` through the [`Engine`] contract.
//!
//! ## On-disk Layout
//! ```text
//! {path}/
//!   ├── conf            (storage parameters)
//!   ├── db              (log-structured page store holding the ordered tree)
//!   ├── snap.{lsn}      (page-table snapshots)
//!   └── blobs/{lsn}     (values too large to live inline in a segment)
//! ```
//! A value is stored out-of-line in `blobs/` once it exceeds roughly a
//! quarter of `segment_size`. `conf` pins `segment_size` for the life of
//! the directory.
//!
//! ## Directory Lock
//! `db` carries an exclusive `flock`. Background work can keep it alive
//! after the last `Db` handle drops, so `close` waits until the lock can be
//! taken before it reports success.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use ::sled::transaction::{TransactionError, TransactionResult};

use super::{Engine, EngineResult, Reclaim};
use crate::artifacts::{ArtifactLayout, ArtifactRule};

// -----------------------------------------------------------------------------
// Constants
// -----------------------------------------------------------------------------

/// Name of the locked page-store file
const DB_FILE: &str = "db";

/// Upper bound on how long `close` waits for the directory lock
const LOCK_RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Space/throughput trade-off, mirrors `sled::Mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SledMode {
    LowSpace,
    HighThroughput,
}

impl From<SledMode> for ::sled::Mode {
    fn from(mode: SledMode) -> Self {
        match mode {
            SledMode::LowSpace => ::sled::Mode::LowSpace,
            SledMode::HighThroughput => ::sled::Mode::HighThroughput,
        }
    }
}

/// Tuning knobs for a sled instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SledConfig {
    /// Page cache size in bytes
    pub cache_capacity: u64,

    /// Log segment size in bytes (power of two, 256 B ..= 16 MiB)
    pub segment_size: usize,

    pub mode: SledMode,

    /// Background flush interval; `None` disables the flusher thread
    pub flush_every_ms: Option<u64>,
}

impl Default for SledConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1024 * 1024 * 1024, // 1 GiB
            segment_size: 512 * 1024,           // 512 KiB
            mode: SledMode::LowSpace,
            flush_every_ms: Some(500),
        }
    }
}

impl SledConfig {
    fn to_sled(&self, path: &Path) -> ::sled::Config {
        ::sled::Config::new()
            .path(path)
            .cache_capacity(self.cache_capacity)
            .segment_size(self.segment_size)
            .mode(self.mode.into())
            .flush_every_ms(self.flush_every_ms)
    }
}

/// An open sled database
pub struct SledEngine {
    db: ::sled::Db,
    path: PathBuf,
}

impl SledEngine {
    /// The underlying handle (for tests and debugging)
    pub fn db(&self) -> &::sled::Db {
        &self.db
    }
}

/// Collapse a transaction error into the storage error it carries
fn flatten(err: TransactionError<::sled::Error>) -> ::sled::Error {
    match err {
        TransactionError::Abort(e) | TransactionError::Storage(e) => e,
    }
}

impl Engine for SledEngine {
    type Config = SledConfig;

    const NAME: &'static str = "sled";

    fn open(path: &Path, config: &SledConfig) -> EngineResult<Self> {
        let db = config.to_sled(path).open()?;
        tracing::trace!(path = %path.display(), recovered = db.was_recovered(), "sled opened");
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    fn set(&self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let result: TransactionResult<(), ::sled::Error> = self.db.transaction(|tx| {
            tx.insert(key, value)?;
            Ok(())
        });
        result.map_err(flatten)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> EngineResult<()> {
        let result: TransactionResult<(), ::sled::Error> = self.db.transaction(|tx| {
            tx.remove(key)?;
            Ok(())
        });
        result.map_err(flatten)?;
        Ok(())
    }

    /// Sled cleans segments on its own; a pass here makes all dirty state
    /// stable so the cleaner can release it. The ratio has no sled
    /// equivalent.
    fn reclaim_value_log(&self, ratio: f64) -> EngineResult<Reclaim> {
        let bytes = self.db.flush()?;
        tracing::trace!(ratio, bytes, "sled flush pass");

        if bytes == 0 {
            Ok(Reclaim::NothingToRewrite)
        } else {
            Ok(Reclaim::Rewritten { bytes: bytes as u64 })
        }
    }

    fn close(self) -> EngineResult<()> {
        let Self { db, path } = self;
        db.flush()?;
        drop(db);

        let waited = wait_for_unlock(&path.join(DB_FILE), LOCK_RELEASE_TIMEOUT)?;
        tracing::trace!(waited_ms = waited.as_millis() as u64, "sled directory unlocked");
        Ok(())
    }

    /// `segment_size` is persisted in `conf` and must match on reopen
    fn baseline(config: &SledConfig) -> SledConfig {
        SledConfig {
            segment_size: config.segment_size,
            ..SledConfig::default()
        }
    }

    fn artifact_layout() -> ArtifactLayout {
        ArtifactLayout::new(
            vec![ArtifactRule::FileName("db"), ArtifactRule::Prefix("snap.")],
            vec![ArtifactRule::ParentDir("blobs")],
        )
    }
}

// -----------------------------------------------------------------------------
// Lock Probing
// -----------------------------------------------------------------------------

/// Poll until an exclusive lock on `file` can be taken, returning how long
/// that took
fn wait_for_unlock(file: &Path, timeout: Duration) -> io::Result<Duration> {
    let start = Instant::now();
    loop {
        match probe_lock(file) {
            Ok(()) => return Ok(start.elapsed()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if start.elapsed() >= timeout {
                    return Err(io::Error::new(
                        io::ErrorKind::WouldBlock,
                        format!("{} still locked after {:?}", file.display(), timeout),
                    ));
                }
                thread::sleep(LOCK_POLL_INTERVAL);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Take an exclusive lock on `file` and release it again
#[cfg(unix)]
fn probe_lock(file: &Path) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let handle = File::open(file)?;

    // SAFETY: `handle` owns a valid descriptor for the whole call
    let result = unsafe { libc::flock(handle.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }

    // Closing the descriptor drops the lock
    drop(handle);
    Ok(())
}

#[cfg(not(unix))]
fn probe_lock(file: &Path) -> io::Result<()> {
    File::open(file).map(drop)
}
