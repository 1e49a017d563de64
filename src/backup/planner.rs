//! Backup destination naming and discovery of the previous backup.

use chrono::NaiveDateTime;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

use super::archive::archive_path;
use crate::Result;

/// Prefix of every backup folder or archive name
pub const BACKUP_PREFIX: &str = "kobo_backup_";

/// Minute resolution; two runs in the same minute map to the same path.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Which kind of entries count as earlier backups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
    /// Plain folders; only subdirectories are considered
    Directory,
    /// `.tar.gz` archives; every entry is considered
    Archive,
}

impl BackupMode {
    pub fn from_compression(compression: bool) -> Self {
        if compression {
            BackupMode::Archive
        } else {
            BackupMode::Directory
        }
    }
}

/// Plans backup paths below one base directory
#[derive(Debug, Clone)]
pub struct BackupPathPlanner {
    base_directory: PathBuf,
}

impl BackupPathPlanner {
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Self {
        Self {
            base_directory: base_directory.as_ref().to_path_buf(),
        }
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// `<base>/kobo_backup_<YYYY-MM-DD_HH-MM>` for `now`.
    pub fn plan(&self, now: NaiveDateTime) -> PathBuf {
        self.base_directory
            .join(format!("{}{}", BACKUP_PREFIX, now.format(TIMESTAMP_FORMAT)))
    }

    /// The minute a backup at `path` was taken, read back from its name.
    pub fn backup_time(path: &Path) -> Option<NaiveDateTime> {
        let name = path.file_name()?.to_str()?;
        let stamp = name.strip_prefix(BACKUP_PREFIX)?;
        let stamp = stamp.strip_suffix(super::archive::ARCHIVE_SUFFIX).unwrap_or(stamp);
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
    }

    /// Create the base directory if needed. Returns whether it already existed.
    pub fn ensure_base_exists(&self) -> Result<bool> {
        if self.base_directory.is_dir() {
            info!(
                "An existing kobo backup folder was detected at {}",
                self.base_directory.display()
            );
            return Ok(true);
        }

        info!(
            "No backup folder detected. Creating {}",
            self.base_directory.display()
        );
        fs::create_dir_all(&self.base_directory)?;
        Ok(false)
    }

    /// True when `target` already holds a backup, as a folder or an archive.
    pub fn is_taken(&self, target: &Path) -> bool {
        target.exists() || archive_path(target).exists()
    }

    /// Atomically create `target`. Returns `false` if another run got there
    /// first.
    pub fn claim(&self, target: &Path) -> Result<bool> {
        match fs::create_dir(target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// The most recently modified entry of the base directory, if any.
    pub fn find_previous(&self, mode: BackupMode) -> Result<Option<PathBuf>> {
        let entries = match fs::read_dir(&self.base_directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut latest: Option<(SystemTime, PathBuf)> = None;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if mode == BackupMode::Directory && !path.is_dir() {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    debug!("Ignoring {}: {}", path.display(), e);
                    continue;
                }
            };

            if latest.as_ref().map_or(true, |(time, _)| modified > *time) {
                latest = Some((modified, path));
            }
        }

        Ok(latest.map(|(_, path)| path))
    }
}
