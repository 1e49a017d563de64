//! Recursive copy of the device tree into a claimed backup folder.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Metadata folders that USB hosts create on removable media and often
/// refuse to let anyone read.
const RESERVED_NAMES: &[&str] = &[
    ".Trashes",
    "$RECYCLE.BIN",
    "System Volume Information",
    ".Spotlight-V100",
    ".fseventsd",
];

/// Totals for one copy run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
    pub skipped: usize,
}

/// True when `relative` lies inside host-reserved metadata.
pub fn is_reserved(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            RESERVED_NAMES.contains(&name.as_ref()) || name.starts_with(".Trash")
        }
        _ => false,
    })
}

/// Copy everything under `source` into the existing directory `target`.
///
/// Permission failures inside reserved metadata are skipped. Any other
/// failure stops the copy with [`Error::CopyFailed`] and leaves what was
/// already copied in place.
pub fn copy_tree(source: &Path, target: &Path) -> Result<CopyStats> {
    info!("Copying {} to {}", source.display(), target.display());

    let mut stats = CopyStats::default();
    // applied deepest-first once the contents are in place
    let mut directory_permissions: Vec<(PathBuf, fs::Permissions)> = Vec::new();

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(source).to_path_buf();
                let relative = path.strip_prefix(source).unwrap_or(&path).to_path_buf();
                skip_or_fail(&relative, path, e.into(), &mut stats)?;
                continue;
            }
        };

        let path = entry.path();
        let relative = path.strip_prefix(source).unwrap_or(path);
        let destination = target.join(relative);
        let file_type = entry.file_type();

        let result = if file_type.is_dir() {
            fs::create_dir(&destination).and_then(|()| {
                // reserved folders keep default modes so the backup stays readable
                if !is_reserved(relative) {
                    let permissions = entry.metadata().map_err(io::Error::from)?.permissions();
                    directory_permissions.push((destination.clone(), permissions));
                }
                stats.directories += 1;
                Ok(())
            })
        } else if file_type.is_symlink() {
            copy_symlink(path, &destination)
        } else {
            fs::copy(path, &destination).map(|bytes| {
                debug!("Copied {}", relative.display());
                stats.files += 1;
                stats.bytes += bytes;
            })
        };

        if let Err(e) = result {
            skip_or_fail(relative, path.to_path_buf(), e, &mut stats)?;
        }
    }

    for (directory, permissions) in directory_permissions.into_iter().rev() {
        fs::set_permissions(&directory, permissions).map_err(|source| Error::CopyFailed {
            path: directory.clone(),
            source,
        })?;
    }

    info!(
        "Copied {} files in {} directories ({} bytes, {} skipped)",
        stats.files, stats.directories, stats.bytes, stats.skipped
    );
    Ok(stats)
}

fn skip_or_fail(relative: &Path, path: PathBuf, error: io::Error, stats: &mut CopyStats) -> Result<()> {
    if error.kind() == ErrorKind::PermissionDenied && is_reserved(relative) {
        warn!("Skipping protected device metadata {}: {}", path.display(), error);
        stats.skipped += 1;
        return Ok(());
    }

    Err(Error::CopyFailed {
        path,
        source: error,
    })
}

#[cfg(unix)]
fn copy_symlink(link: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, destination)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _destination: &Path) -> io::Result<()> {
    debug!("Not copying symbolic link {}", link.display());
    Ok(())
}
