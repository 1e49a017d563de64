//! macOS discovery through `df`.

use std::path::PathBuf;

use super::{run_listing, DeviceLocator, OsKind, SystemInfo};
use crate::Result;

/// Finds labelled volumes under `/Volumes` in `df -Hl` output
#[derive(Debug, Default, Clone, Copy)]
pub struct DfLocator;

impl DeviceLocator for DfLocator {
    fn locate(&self, volume_label: &str) -> Result<SystemInfo> {
        let output = run_listing("df", &["-Hl"])?;
        Ok(SystemInfo::new(OsKind::MacOs, parse_df(&output, volume_label)))
    }
}

/// A line matches when any of its fields contains `/Volumes/<label>`; the
/// mount point is the last field of that line.
///
/// Mount points containing spaces are cut at the last space. macOS names a
/// second volume with the same label `/Volumes/<label> 1`, which therefore
/// shows up as `1`; it still counts as a second match.
pub fn parse_df(output: &str, volume_label: &str) -> Vec<PathBuf> {
    let needle = format!("/Volumes/{}", volume_label);

    output
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| fields.iter().any(|field| field.contains(&needle)))
        .filter_map(|fields| fields.last().map(PathBuf::from))
        .collect()
}
