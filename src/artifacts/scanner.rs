//! Artifact Scanner
//!
//! Recursive, all-or-nothing directory accounting.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ArtifactLayout, Metrics};
use crate::error::{HarnessError, Result};

/// Scan `root` and aggregate tracked files per class
///
/// Symlinks and untracked files are skipped. The first I/O error aborts
/// the scan, since a partial walk would under-report the footprint.
pub fn scan(root: &Path, layout: &ArtifactLayout) -> Result<Metrics> {
    let mut metrics = Metrics::default();

    // Directories still to visit (depth-first)
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(scan_error(&dir))? {
            let entry = entry.map_err(scan_error(&dir))?;
            let path = entry.path();

            // Does not follow symlinks
            let file_type = entry.file_type().map_err(scan_error(&path))?;
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let Some(class) = layout.classify(&path) else {
                continue;
            };

            let len = entry.metadata().map_err(scan_error(&path))?.len();
            metrics.class_mut(class).add_file(len);
        }
    }

    tracing::debug!(root = %root.display(), %metrics, "artifact scan complete");
    Ok(metrics)
}

fn scan_error(path: &Path) -> impl FnOnce(io::Error) -> HarnessError {
    let path: PathBuf = path.to_path_buf();
    move |source| HarnessError::Scan { path, source }
}
