//! Operator-facing summary of a finished backup.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::device::OsKind;
use crate::size::{count_files, directory_size, human_size};

/// File count and size of one backup folder or archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSummary {
    pub path: PathBuf,
    pub file_count: usize,
    pub size_bytes: u64,
    /// `size_bytes` formatted for humans, e.g. `1.20MB`
    pub size: String,
}

impl BackupSummary {
    /// Measure the backup at `path`.
    pub fn collect(path: &Path) -> Self {
        let size_bytes = directory_size(path);
        Self {
            path: path.to_path_buf(),
            file_count: count_files(path),
            size_bytes,
            size: human_size(size_bytes),
        }
    }
}

/// Result of a completed backup run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    pub os_kind: OsKind,
    pub device_mount: PathBuf,
    pub compressed: bool,
    pub completed_at: NaiveDateTime,
    pub backup: BackupSummary,
    /// Protected device metadata entries left out of the copy
    #[serde(default)]
    pub skipped_entries: usize,
    /// The most recent backup that existed before this run
    pub previous: Option<BackupSummary>,
}

impl BackupReport {
    /// Lines printed to the operator after a backup.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Kobo mountpoint is: {} on {}.",
            self.device_mount.display(),
            self.os_kind
        )];

        if let Some(previous) = &self.previous {
            lines.push(format!(
                "The previous backup contained {} files and was {}.",
                previous.file_count, previous.size
            ));
        }

        if self.skipped_entries > 0 {
            lines.push(format!(
                "Skipped {} protected system entries on the device.",
                self.skipped_entries
            ));
        }

        lines.push(format!(
            "Backup complete. Copied {} files with a size of {} to {}.",
            self.backup.file_count,
            self.backup.size,
            self.backup.path.display()
        ));

        lines
    }
}
