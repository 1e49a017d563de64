//! Desktop notifications.
//!
//! Notifications are fire-and-forget: callers log a failed notification and
//! carry on, it never changes the outcome of a backup.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::device::OsKind;
use crate::{Error, Result};

pub mod desktop;

pub use desktop::DesktopNotifier;

/// Something that can tell the user what happened
pub trait Notifier: Send + Sync {
    /// A device with the watched label was just attached.
    fn device_connected(&self, os_kind: OsKind, volume_label: &str) -> Result<()>;

    /// A backup finished at `path`.
    fn backup_completed(&self, os_kind: OsKind, path: &Path, file_count: usize, size: &str) -> Result<()>;
}

/// A notification as recorded by [`MockNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    DeviceConnected {
        volume_label: String,
    },
    BackupCompleted {
        path: PathBuf,
        file_count: usize,
        size: String,
    },
}

/// Notifier that records notices instead of showing them
#[derive(Debug, Default)]
pub struct MockNotifier {
    fail: bool,
    notices: Mutex<Vec<Notice>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails after recording the notice.
    pub fn failing() -> Self {
        Self {
            fail: true,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    fn record(&self, notice: Notice) -> Result<()> {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }

        if self.fail {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "notification service unavailable",
            )));
        }
        Ok(())
    }
}

impl Notifier for MockNotifier {
    fn device_connected(&self, _os_kind: OsKind, volume_label: &str) -> Result<()> {
        self.record(Notice::DeviceConnected {
            volume_label: volume_label.to_string(),
        })
    }

    fn backup_completed(&self, _os_kind: OsKind, path: &Path, file_count: usize, size: &str) -> Result<()> {
        self.record(Notice::BackupCompleted {
            path: path.to_path_buf(),
            file_count,
            size: size.to_string(),
        })
    }
}
