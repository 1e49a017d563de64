//! Notifications through the host's desktop tools.

use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::Notifier;
use crate::device::OsKind;
use crate::Result;

/// `notify-send`/`xdg-open` on Linux, `osascript`/`say`/`open` on macOS.
/// Windows gets no notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn device_connected(&self, os_kind: OsKind, volume_label: &str) -> Result<()> {
        let title = format!("{} connected", volume_label);
        match os_kind {
            OsKind::Linux => {
                Command::new("notify-send")
                    .args([title.as_str(), "Attempting backup..."])
                    .status()?;
            }
            OsKind::MacOs => {
                Command::new("osascript")
                    .arg("-e")
                    .arg(apple_notification(&title, "Attempting backup..."))
                    .status()?;
            }
            OsKind::Windows => debug!("No desktop notification on Windows"),
        }
        Ok(())
    }

    fn backup_completed(&self, os_kind: OsKind, path: &Path, file_count: usize, size: &str) -> Result<()> {
        let body = format!("{} files ({}) saved to {}", file_count, size, path.display());
        match os_kind {
            OsKind::Linux => {
                Command::new("notify-send").args(["Backed up!", body.as_str()]).status()?;
                Command::new("xdg-open").arg(path).status()?;
            }
            OsKind::MacOs => {
                Command::new("osascript")
                    .arg("-e")
                    .arg(apple_notification("Backed up!", &body))
                    .status()?;
                Command::new("say").arg("Kobo backed up").status()?;
                Command::new("open").arg(path).status()?;
            }
            OsKind::Windows => debug!("No desktop notification on Windows"),
        }
        Ok(())
    }
}

/// AppleScript for a Notification Center banner.
fn apple_notification(title: &str, body: &str) -> String {
    format!(
        "display notification \"{}\" with title \"{}\"",
        escape_applescript(body),
        escape_applescript(title)
    )
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
