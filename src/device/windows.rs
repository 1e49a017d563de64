//! Windows discovery through the `Win32_LogicalDisk` CIM class.

use serde::Deserialize;
use std::path::PathBuf;

use super::{run_listing, DeviceLocator, OsKind, SystemInfo};
use crate::{Error, Result};

const POWERSHELL: &str = "powershell";
const CIM_QUERY: &str =
    "Get-CimInstance -ClassName Win32_LogicalDisk | Select-Object DeviceID, VolumeName | ConvertTo-Json";

#[derive(Debug, Deserialize)]
struct LogicalDisk {
    #[serde(rename = "DeviceID")]
    device_id: String,
    #[serde(rename = "VolumeName")]
    volume_name: Option<String>,
}

/// `ConvertTo-Json` emits a bare object when there is a single disk
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LogicalDisks {
    Many(Vec<LogicalDisk>),
    One(LogicalDisk),
}

/// Finds labelled logical disks through PowerShell
#[derive(Debug, Default, Clone, Copy)]
pub struct CimLocator;

impl DeviceLocator for CimLocator {
    fn locate(&self, volume_label: &str) -> Result<SystemInfo> {
        let output = run_listing(POWERSHELL, &["-NoProfile", "-NonInteractive", "-Command", CIM_QUERY])?;
        let mounts = parse_logical_disks(&output, volume_label)?;
        Ok(SystemInfo::new(OsKind::Windows, mounts))
    }
}

/// Drive roots (`E:\`) of logical disks whose volume name is `volume_label`.
pub fn parse_logical_disks(json: &str, volume_label: &str) -> Result<Vec<PathBuf>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let disks: LogicalDisks = serde_json::from_str(json).map_err(|e| Error::DeviceQuery {
        command: CIM_QUERY.to_string(),
        reason: format!("unexpected output: {}", e),
    })?;

    let disks = match disks {
        LogicalDisks::Many(disks) => disks,
        LogicalDisks::One(disk) => vec![disk],
    };

    Ok(disks
        .into_iter()
        .filter(|disk| disk.volume_name.as_deref() == Some(volume_label))
        .map(|disk| PathBuf::from(format!("{}\\", disk.device_id)))
        .collect())
}
