//! Size and file-count accounting for backup trees.
//!
//! Everything here is best-effort: entries that cannot be read contribute
//! nothing instead of failing the report.

use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::backup::archive;

/// Unit prefixes tried in order by [`format_size`]; the last one absorbs any
/// overflow.
const UNITS: &[&str] = &["", "K", "M", "G", "T", "P", "E", "Z", "Y"];

/// Recursively sum the sizes of all files under `path`.
///
/// A regular file reports its own length. Unreadable subtrees and missing
/// paths count as zero.
pub fn directory_size<P: AsRef<Path>>(path: P) -> u64 {
    let path = path.as_ref();

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => return metadata.len(),
        Ok(_) => {}
        Err(e) => {
            debug!("Cannot stat {}: {}", path.display(), e);
            return 0;
        }
    }

    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Format a byte count as a human readable string such as `1.20MB`.
///
/// The value is divided by `unit_factor` until it drops below it, and always
/// carries two decimals and a trailing `B`. A factor below 2 cannot scale, so
/// the plain byte count is returned.
pub fn format_size(bytes: u64, unit_factor: u64) -> String {
    let mut size = bytes as f64;
    if unit_factor < 2 {
        return format!("{:.2}B", size);
    }

    let factor = unit_factor as f64;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if size < factor {
            break;
        }
        size /= factor;
        unit = next;
    }

    format!("{:.2}{}B", size, unit)
}

/// [`format_size`] with the usual binary factor.
pub fn human_size(bytes: u64) -> String {
    format_size(bytes, 1024)
}

/// Count the regular files that make up a backup.
///
/// Directories are walked recursively. A `.tar.gz` backup archive reports
/// the number of file entries it holds; any other file counts as one.
pub fn count_files<P: AsRef<Path>>(path: P) -> usize {
    let path = path.as_ref();

    if path.is_file() {
        if archive::is_archive(path) {
            return archive::count_archive_files(path).unwrap_or_else(|e| {
                debug!("Cannot read archive {}: {}", path.display(), e);
                0
            });
        }
        return 1;
    }

    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, len: usize) {
        let mut file = File::create(path).unwrap();
        file.write_all(&vec![b'k'; len]).unwrap();
    }

    #[test]
    fn test_format_size_fixtures() {
        assert_eq!(format_size(1253656, 1024), "1.20MB");
        assert_eq!(format_size(1253656678, 1024), "1.17GB");
        assert_eq!(format_size(0, 1024), "0.00B");
        assert_eq!(format_size(1024, 1024), "1.00KB");
        assert_eq!(human_size(300), "300.00B");
    }

    #[test]
    fn test_format_size_decimal_factor() {
        assert_eq!(format_size(1500, 1000), "1.50KB");
        assert_eq!(format_size(999, 1000), "999.00B");
    }

    #[test]
    fn test_format_size_large_values() {
        assert_eq!(format_size(u64::MAX, 1024), "16.00EB");
        // a tiny factor walks through every prefix and stops at Y
        assert_eq!(format_size(1 << 20, 2), "4096.00YB");
    }

    #[test]
    fn test_format_size_degenerate_factor() {
        assert_eq!(format_size(5, 0), "5.00B");
        assert_eq!(format_size(1 << 20, 1), "1048576.00B");
    }

    #[test]
    fn test_directory_size_sums_nested_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        write_file(&temp_dir.path().join("ten"), 10);
        write_file(&temp_dir.path().join("a").join("twenty"), 20);
        write_file(&nested.join("thirty"), 30);

        assert_eq!(directory_size(temp_dir.path()), 60);
        assert_eq!(count_files(temp_dir.path()), 3);
    }

    #[test]
    fn test_directory_size_of_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("book.epub");
        write_file(&file, 4096);

        assert_eq!(directory_size(&file), 4096);
        assert_eq!(count_files(&file), 1);
    }

    #[test]
    fn test_directory_size_of_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(directory_size(temp_dir.path().join("missing")), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_size_of_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        if nix::unistd::Uid::effective().is_root() {
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        write_file(&locked.join("hidden"), 50);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let size = directory_size(&locked);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(size, 0);
    }
}
