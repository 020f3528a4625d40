//! Artifact Layout
//!
//! Rules that map an engine's file names onto the two tracked classes.

use std::ffi::OsStr;
use std::path::Path;

/// The two artifact classes the scanner tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactClass {
    /// Sorted-table / index files
    Table,

    /// Append-only value-log files
    ValueLog,
}

/// A single matching rule, checked against a regular file's path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRule {
    /// File extension without the dot, e.g. `"sst"`
    Extension(&'static str),

    /// Exact file name
    FileName(&'static str),

    /// File name prefix
    Prefix(&'static str),

    /// Name of the directory directly containing the file
    ParentDir(&'static str),
}

impl ArtifactRule {
    pub fn matches(&self, path: &Path) -> bool {
        match *self {
            ArtifactRule::Extension(ext) => path.extension() == Some(OsStr::new(ext)),
            ArtifactRule::FileName(name) => path.file_name() == Some(OsStr::new(name)),
            ArtifactRule::Prefix(prefix) => path
                .file_name()
                .and_then(OsStr::to_str)
                .map_or(false, |name| name.starts_with(prefix)),
            ArtifactRule::ParentDir(dir) => path
                .parent()
                .and_then(Path::file_name)
                .map_or(false, |name| name == OsStr::new(dir)),
        }
    }
}

/// How an engine names its artifacts
///
/// Table rules are checked first, so a file never counts twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    tables: Vec<ArtifactRule>,
    value_logs: Vec<ArtifactRule>,
}

impl ArtifactLayout {
    pub fn new(tables: Vec<ArtifactRule>, value_logs: Vec<ArtifactRule>) -> Self {
        Self { tables, value_logs }
    }

    /// Classify purely by extension
    pub fn by_extension(table_ext: &'static str, value_log_ext: &'static str) -> Self {
        Self::new(
            vec![ArtifactRule::Extension(table_ext)],
            vec![ArtifactRule::Extension(value_log_ext)],
        )
    }

    /// Class of the file at `path`, or `None` if it is not tracked
    pub fn classify(&self, path: &Path) -> Option<ArtifactClass> {
        if self.tables.iter().any(|rule| rule.matches(path)) {
            Some(ArtifactClass::Table)
        } else if self.value_logs.iter().any(|rule| rule.matches(path)) {
            Some(ArtifactClass::ValueLog)
        } else {
            None
        }
    }
}

/// `.sst` tables and `.vlog` value logs
impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::by_extension("sst", "vlog")
    }
}
