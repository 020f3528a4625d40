//! Footprint metrics for one scenario.

use std::fmt;

use super::ArtifactClass;

/// File count and size for one artifact class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassTotals {
    pub files: u64,

    /// Sum of each file's size truncated to whole KiB
    pub size_kib: u64,
}

impl ClassTotals {
    /// Account for one file of `len` bytes
    pub fn add_file(&mut self, len: u64) {
        self.files += 1;
        self.size_kib += len / 1024;
    }
}

/// Aggregate footprint of a closed engine's directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub tables: ClassTotals,
    pub value_logs: ClassTotals,
}

impl Metrics {
    pub fn class(&self, class: ArtifactClass) -> &ClassTotals {
        match class {
            ArtifactClass::Table => &self.tables,
            ArtifactClass::ValueLog => &self.value_logs,
        }
    }

    pub fn class_mut(&mut self, class: ArtifactClass) -> &mut ClassTotals {
        match class {
            ArtifactClass::Table => &mut self.tables,
            ArtifactClass::ValueLog => &mut self.value_logs,
        }
    }

    pub fn total_files(&self) -> u64 {
        self.tables.files + self.value_logs.files
    }

    pub fn total_size_kib(&self) -> u64 {
        self.tables.size_kib + self.value_logs.size_kib
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tables={} files ({} KiB), value-logs={} files ({} KiB)",
            self.tables.files, self.tables.size_kib, self.value_logs.files, self.value_logs.size_kib
        )
    }
}
