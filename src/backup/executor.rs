//! One backup run, from device lookup to notification.

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, span, warn, Level};

use super::archive::compress_dir;
use super::copy::copy_tree;
use super::planner::{BackupMode, BackupPathPlanner};
use super::report::{BackupReport, BackupSummary};
use crate::config::Config;
use crate::device::{DeviceLocator, SystemInfo};
use crate::notify::Notifier;
use crate::{Error, Result};

/// How a run ended when nothing went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// No mounted volume carries the configured label
    NoDeviceFound,
    /// A backup already exists for this minute
    DuplicateBackupWindow { path: PathBuf },
    Completed(BackupReport),
}

/// Pick the single device mount, if there is exactly one.
///
/// No mount is `Ok(None)`; more than one is [`Error::AmbiguousDevice`].
pub fn select_mount(info: &SystemInfo) -> Result<Option<&Path>> {
    match info.device_mounts.as_slice() {
        [] => Ok(None),
        [mount] => Ok(Some(mount.as_path())),
        mounts => Err(Error::AmbiguousDevice {
            mounts: mounts.to_vec(),
        }),
    }
}

/// Runs backups with an explicit configuration, locator and notifier
pub struct BackupExecutor<'a> {
    config: &'a Config,
    locator: &'a dyn DeviceLocator,
    notifier: &'a dyn Notifier,
}

impl<'a> BackupExecutor<'a> {
    pub fn new(config: &'a Config, locator: &'a dyn DeviceLocator, notifier: &'a dyn Notifier) -> Self {
        Self {
            config,
            locator,
            notifier,
        }
    }

    /// Back up the device now.
    pub fn run(&self) -> Result<BackupOutcome> {
        self.run_at(Local::now().naive_local())
    }

    /// Back up the device as if the current local time were `now`.
    pub fn run_at(&self, now: NaiveDateTime) -> Result<BackupOutcome> {
        let span = span!(Level::INFO, "backup", label = %self.config.volume_label);
        let _enter = span.enter();

        let info = self.locator.locate(&self.config.volume_label)?;
        let mount = match select_mount(&info)? {
            Some(mount) => mount,
            None => {
                info!("No device labelled {} is mounted", self.config.volume_label);
                return Ok(BackupOutcome::NoDeviceFound);
            }
        };
        info!("Kobo mountpoint is {} on {}", mount.display(), info.os_kind);

        let planner = BackupPathPlanner::new(&self.config.backup_directory);
        planner.ensure_base_exists()?;

        let target = planner.plan(now);
        if planner.is_taken(&target) {
            info!("Backup window already used by {}", target.display());
            return Ok(BackupOutcome::DuplicateBackupWindow { path: target });
        }

        let mode = BackupMode::from_compression(self.config.compression);
        let previous = planner.find_previous(mode)?;

        if !planner.claim(&target)? {
            info!("Another run claimed {} first", target.display());
            return Ok(BackupOutcome::DuplicateBackupWindow { path: target });
        }

        let stats = copy_tree(mount, &target)?;

        let final_path = if self.config.compression {
            compress_and_clean(&target)?
        } else {
            target
        };

        let report = BackupReport {
            os_kind: info.os_kind,
            device_mount: mount.to_path_buf(),
            compressed: self.config.compression,
            completed_at: now,
            backup: BackupSummary::collect(&final_path),
            skipped_entries: stats.skipped,
            previous: previous.as_deref().map(BackupSummary::collect),
        };

        info!(
            "Backup complete: {} files, {} at {}",
            report.backup.file_count,
            report.backup.size,
            final_path.display()
        );

        if let Err(e) = self.notifier.backup_completed(
            info.os_kind,
            &final_path,
            report.backup.file_count,
            &report.backup.size,
        ) {
            warn!("Notification failed: {}", e);
        }

        Ok(BackupOutcome::Completed(report))
    }
}

/// Archive `target` and remove the folder once the archive is written.
fn compress_and_clean(target: &Path) -> Result<PathBuf> {
    let archive = compress_dir(target)?;

    fs::remove_dir_all(target).map_err(|source| Error::CleanupFailed {
        path: target.to_path_buf(),
        source,
    })?;

    Ok(archive)
}
