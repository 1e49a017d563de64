//! Linux discovery through `lsblk`.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

use super::{run_listing, DeviceLocator, OsKind, SystemInfo};
use crate::{Error, Result};

const LSBLK: &str = "lsblk";
const LSBLK_ARGS: &[&str] = &["-f", "--json"];

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<BlockDevice>,
}

#[derive(Debug, Deserialize)]
struct BlockDevice {
    name: Option<String>,
    label: Option<String>,
    /// util-linux < 2.37
    mountpoint: Option<String>,
    /// util-linux >= 2.37
    #[serde(default)]
    mountpoints: Vec<Option<String>>,
    #[serde(default)]
    children: Vec<BlockDevice>,
}

impl BlockDevice {
    fn mount(&self) -> Option<&str> {
        self.mountpoint
            .as_deref()
            .or_else(|| self.mountpoints.iter().flatten().map(String::as_str).next())
    }
}

/// Finds labelled volumes in `lsblk` JSON output
#[derive(Debug, Default, Clone, Copy)]
pub struct LsblkLocator;

impl DeviceLocator for LsblkLocator {
    fn locate(&self, volume_label: &str) -> Result<SystemInfo> {
        let output = run_listing(LSBLK, LSBLK_ARGS)?;
        let mounts = parse_lsblk(&output, volume_label)?;
        Ok(SystemInfo::new(OsKind::Linux, mounts))
    }
}

/// Extract the mount points of devices labelled `volume_label`.
///
/// Partitions nested under `children` are searched too. Matching devices that
/// are not mounted are skipped.
pub fn parse_lsblk(json: &str, volume_label: &str) -> Result<Vec<PathBuf>> {
    let output: LsblkOutput = serde_json::from_str(json).map_err(|e| Error::DeviceQuery {
        command: format!("{} {}", LSBLK, LSBLK_ARGS.join(" ")),
        reason: format!("unexpected output: {}", e),
    })?;

    let mut mounts = Vec::new();
    collect_mounts(&output.blockdevices, volume_label, &mut mounts);
    Ok(mounts)
}

fn collect_mounts(devices: &[BlockDevice], volume_label: &str, mounts: &mut Vec<PathBuf>) {
    for device in devices {
        if device.label.as_deref() == Some(volume_label) {
            match device.mount() {
                Some(mount) => mounts.push(PathBuf::from(mount)),
                None => debug!(
                    "Device {} is labelled {} but not mounted",
                    device.name.as_deref().unwrap_or("?"),
                    volume_label
                ),
            }
        }
        collect_mounts(&device.children, volume_label, mounts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OLD_FORMAT: &str = r#"{
        "blockdevices": [
            {"name": "sda", "fstype": null, "label": null, "uuid": null, "mountpoint": null,
             "children": [
                {"name": "sda1", "fstype": "ext4", "label": "root", "uuid": "1", "mountpoint": "/"}
             ]},
            {"name": "sdb", "fstype": "vfat", "label": "KOBOeReader", "uuid": "2",
             "mountpoint": "/media/user/KOBOeReader"}
        ]
    }"#;

    const NEW_FORMAT: &str = r#"{
        "blockdevices": [
            {"name": "nvme0n1", "fstype": null, "fsver": null, "label": null, "uuid": null,
             "fsavail": null, "fsuse%": null, "mountpoints": [null],
             "children": [
                {"name": "nvme0n1p2", "fstype": "ext4", "label": null, "mountpoints": ["/"]}
             ]},
            {"name": "sdc", "fstype": null, "label": null, "mountpoints": [null],
             "children": [
                {"name": "sdc1", "fstype": "vfat", "label": "KOBOeReader",
                 "mountpoints": ["/run/media/user/KOBOeReader"]}
             ]}
        ]
    }"#;

    #[test]
    fn test_parse_top_level_mountpoint() {
        let mounts = parse_lsblk(OLD_FORMAT, "KOBOeReader").unwrap();
        assert_eq!(mounts, vec![PathBuf::from("/media/user/KOBOeReader")]);
    }

    #[test]
    fn test_parse_nested_partition_mountpoints() {
        let mounts = parse_lsblk(NEW_FORMAT, "KOBOeReader").unwrap();
        assert_eq!(mounts, vec![PathBuf::from("/run/media/user/KOBOeReader")]);
    }

    #[test]
    fn test_parse_no_match() {
        assert!(parse_lsblk(OLD_FORMAT, "NOOK").unwrap().is_empty());
    }

    #[test]
    fn test_parse_unmounted_device_is_skipped() {
        let json = r#"{"blockdevices": [{"name": "sdb", "label": "KOBOeReader", "mountpoint": null}]}"#;
        assert!(parse_lsblk(json, "KOBOeReader").unwrap().is_empty());
    }

    #[test]
    fn test_parse_two_devices() {
        let json = r#"{"blockdevices": [
            {"name": "sdb", "label": "KOBOeReader", "mountpoint": "/media/a"},
            {"name": "sdc", "label": "KOBOeReader", "mountpoint": "/media/b"}
        ]}"#;
        let mounts = parse_lsblk(json, "KOBOeReader").unwrap();
        assert_eq!(mounts, vec![PathBuf::from("/media/a"), PathBuf::from("/media/b")]);
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_lsblk("lsblk: unknown column", "KOBOeReader").unwrap_err();
        assert!(matches!(err, Error::DeviceQuery { .. }));
    }
}
