//! Device discovery by volume label.
//!
//! Each supported host has its own [`DeviceLocator`] that shells out to the
//! platform's read-only listing tool and parses its output:
//!
//! | Module    | OS      | Source                                   |
//! |-----------|---------|------------------------------------------|
//! | `linux`   | Linux   | `lsblk -f --json`                        |
//! | `macos`   | macOS   | `df -Hl`                                 |
//! | `windows` | Windows | `Win32_LogicalDisk` via `Get-CimInstance` |
//!
//! The parsers are compiled on every platform so they can be tested anywhere.
//! [`HostLocator`] picks the right implementation at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::{Error, Result};

pub mod linux;
pub mod macos;
pub mod windows;

pub use linux::LsblkLocator;
pub use macos::DfLocator;
pub use windows::CimLocator;

/// Volume label every Kobo model ships with.
pub const DEFAULT_VOLUME_LABEL: &str = "KOBOeReader";

/// Host operating systems the tool knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsKind {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
}

impl OsKind {
    /// Map a `std::env::consts::OS` style name to a supported kind.
    pub fn from_os_name(name: &str) -> Option<Self> {
        match name {
            "linux" => Some(OsKind::Linux),
            "macos" => Some(OsKind::MacOs),
            "windows" => Some(OsKind::Windows),
            _ => None,
        }
    }

    /// The kind of the running host, or `UnsupportedPlatform`.
    pub fn current() -> Result<Self> {
        Self::from_os_name(std::env::consts::OS).ok_or_else(|| Error::UnsupportedPlatform {
            name: std::env::consts::OS.to_string(),
            version: platform_version(),
        })
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsKind::Windows => write!(f, "Windows"),
            OsKind::MacOs => write!(f, "macOS"),
            OsKind::Linux => write!(f, "Linux"),
        }
    }
}

/// What a locator saw on the host for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os_kind: OsKind,
    /// Mount paths of every volume carrying the requested label, in the
    /// order the platform listed them.
    pub device_mounts: Vec<PathBuf>,
}

impl SystemInfo {
    pub fn new(os_kind: OsKind, device_mounts: Vec<PathBuf>) -> Self {
        Self {
            os_kind,
            device_mounts,
        }
    }
}

/// Finds the mount points of volumes with a given label
pub trait DeviceLocator: Send + Sync {
    /// Query the host for mounted volumes named `volume_label`.
    ///
    /// Returning zero or several mounts is not an error here; the caller
    /// decides what that means.
    fn locate(&self, volume_label: &str) -> Result<SystemInfo>;
}

/// Locator for whatever host the binary is running on
#[derive(Debug, Default, Clone, Copy)]
pub struct HostLocator;

impl DeviceLocator for HostLocator {
    fn locate(&self, volume_label: &str) -> Result<SystemInfo> {
        match OsKind::current()? {
            OsKind::Linux => LsblkLocator.locate(volume_label),
            OsKind::MacOs => DfLocator.locate(volume_label),
            OsKind::Windows => CimLocator.locate(volume_label),
        }
    }
}

/// Locator that always answers with the same [`SystemInfo`]
#[derive(Debug, Clone)]
pub struct FixedLocator {
    info: SystemInfo,
}

impl FixedLocator {
    pub fn new(info: SystemInfo) -> Self {
        Self { info }
    }

    /// A Linux host with the given mounts.
    pub fn with_mounts(mounts: Vec<PathBuf>) -> Self {
        Self::new(SystemInfo::new(OsKind::Linux, mounts))
    }
}

impl DeviceLocator for FixedLocator {
    fn locate(&self, _volume_label: &str) -> Result<SystemInfo> {
        Ok(self.info.clone())
    }
}

/// Run a listing command and return its stdout.
pub(crate) fn run_listing(program: &str, args: &[&str]) -> Result<String> {
    let command = format!("{} {}", program, args.join(" "));
    debug!("Running {}", command);

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::DeviceQuery {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::DeviceQuery {
            command,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Kernel release of the host, best effort.
fn platform_version() -> String {
    Command::new("uname")
        .arg("-r")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_kind_from_name() {
        assert_eq!(OsKind::from_os_name("linux"), Some(OsKind::Linux));
        assert_eq!(OsKind::from_os_name("macos"), Some(OsKind::MacOs));
        assert_eq!(OsKind::from_os_name("windows"), Some(OsKind::Windows));
        assert_eq!(OsKind::from_os_name("freebsd"), None);
    }

    #[test]
    fn test_os_kind_display() {
        assert_eq!(OsKind::MacOs.to_string(), "macOS");
        assert_eq!(OsKind::Linux.to_string(), "Linux");
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_current_os_is_supported() {
        assert!(OsKind::current().is_ok());
    }

    #[test]
    fn test_fixed_locator_ignores_label() {
        let locator = FixedLocator::with_mounts(vec![PathBuf::from("/media/kobo")]);
        let info = locator.locate("anything").unwrap();

        assert_eq!(info.os_kind, OsKind::Linux);
        assert_eq!(info.device_mounts, vec![PathBuf::from("/media/kobo")]);
    }

    #[test]
    fn test_missing_listing_command() {
        let err = run_listing("kobo-backup-no-such-tool", &["--json"]).unwrap_err();
        assert!(matches!(err, Error::DeviceQuery { .. }));
    }
}
