use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::backup::{BackupExecutor, BackupOutcome};
use crate::config::Config;
use crate::device::DeviceLocator;
use crate::notify::Notifier;
use crate::Result;

/// Turns repeated device lookups into attach events.
///
/// The first observation only records the current state, so a device that
/// is already plugged in when the watcher starts is not backed up again.
#[derive(Debug, Default, Clone)]
pub struct AttachDetector {
    present: Option<bool>,
}

impl AttachDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the mounts seen on this poll. Returns `true` on an attach.
    pub fn observe(&mut self, mounts: &[PathBuf]) -> bool {
        let present = !mounts.is_empty();
        let attached = matches!(self.present, Some(false)) && present;
        self.present = Some(present);
        attached
    }

    pub fn is_present(&self) -> bool {
        self.present.unwrap_or(false)
    }
}

/// One watcher's state between polls
pub struct Watcher {
    locator: Box<dyn DeviceLocator>,
    notifier: Box<dyn Notifier>,
    detector: AttachDetector,
}

impl Watcher {
    pub fn new(locator: Box<dyn DeviceLocator>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            locator,
            notifier,
            detector: AttachDetector::new(),
        }
    }

    /// Look for the device once and back it up if it was just attached.
    ///
    /// Returns `None` when there was no attach on this poll.
    pub fn poll(&mut self, config: &Config) -> Result<Option<BackupOutcome>> {
        let info = self.locator.locate(&config.volume_label)?;
        if !self.detector.observe(&info.device_mounts) {
            return Ok(None);
        }

        info!("{} connected", config.volume_label);
        if let Err(e) = self
            .notifier
            .device_connected(info.os_kind, &config.volume_label)
        {
            warn!("Notification failed: {}", e);
        }

        let outcome =
            BackupExecutor::new(config, self.locator.as_ref(), self.notifier.as_ref()).run()?;
        debug!("Watcher backup finished: {:?}", outcome);
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{OsKind, SystemInfo};
    use crate::notify::{MockNotifier, Notice};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Answers with a scripted sequence of mount lists, repeating the last one.
    struct ScriptedLocator {
        polls: Mutex<Vec<Vec<PathBuf>>>,
    }

    impl DeviceLocator for ScriptedLocator {
        fn locate(&self, _volume_label: &str) -> Result<SystemInfo> {
            let mut polls = self.polls.lock().unwrap();
            let mounts = if polls.len() > 1 {
                polls.remove(0)
            } else {
                polls[0].clone()
            };
            Ok(SystemInfo::new(OsKind::Linux, mounts))
        }
    }

    struct SharedNotifier(Arc<MockNotifier>);

    impl Notifier for SharedNotifier {
        fn device_connected(&self, os_kind: OsKind, volume_label: &str) -> Result<()> {
            self.0.device_connected(os_kind, volume_label)
        }

        fn backup_completed(
            &self,
            os_kind: OsKind,
            path: &std::path::Path,
            file_count: usize,
            size: &str,
        ) -> Result<()> {
            self.0.backup_completed(os_kind, path, file_count, size)
        }
    }

    #[test]
    fn test_attach_edges() {
        let mount = vec![PathBuf::from("/media/reader/KOBOeReader")];
        let mut detector = AttachDetector::new();

        assert!(!detector.observe(&[]));
        assert!(detector.observe(&mount));
        assert!(!detector.observe(&mount));
        assert!(detector.is_present());
        assert!(!detector.observe(&[]));
        assert!(detector.observe(&mount));
    }

    #[test]
    fn test_present_at_start_is_not_an_attach() {
        let mut detector = AttachDetector::new();
        assert!(!detector.observe(&[PathBuf::from("E:\\")]));
        assert!(!detector.observe(&[PathBuf::from("E:\\")]));
    }

    #[test]
    fn test_watcher_backs_up_once_per_attach() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let device = temp_dir.path().join("KOBOeReader");
        fs::create_dir_all(&device)?;
        fs::write(device.join("book.epub"), b"chapter one")?;

        let config = Config {
            backup_directory: temp_dir.path().join("backups"),
            ..Config::default()
        };
        let locator = ScriptedLocator {
            polls: Mutex::new(vec![vec![], vec![device.clone()], vec![device.clone()]]),
        };
        let notifier = Arc::new(MockNotifier::new());
        let mut watcher = Watcher::new(
            Box::new(locator),
            Box::new(SharedNotifier(notifier.clone())),
        );

        assert_eq!(watcher.poll(&config)?, None);
        match watcher.poll(&config)? {
            Some(BackupOutcome::Completed(report)) => assert_eq!(report.backup.file_count, 1),
            other => panic!("expected a completed backup, got {:?}", other),
        }
        assert_eq!(watcher.poll(&config)?, None);

        let notices = notifier.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(
            notices[0],
            Notice::DeviceConnected {
                volume_label: "KOBOeReader".to_string()
            }
        );
        Ok(())
    }
}
