//! gzip'd tar archives of finished backup folders.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, EntryType};
use tracing::info;

use crate::{Error, Result};

pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Fixed, moderate gzip level.
pub const COMPRESSION_LEVEL: u32 = 6;

/// `<target>.tar.gz`
pub fn archive_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(ARCHIVE_SUFFIX);
    PathBuf::from(name)
}

pub fn is_archive(path: &Path) -> bool {
    path.to_string_lossy().ends_with(ARCHIVE_SUFFIX)
}

/// Archive `dir` next to itself as `<dir>.tar.gz`.
///
/// The archive holds a single top-level entry named after `dir`. The source
/// folder is left untouched; removing it is up to the caller.
pub fn compress_dir(dir: &Path) -> Result<PathBuf> {
    let archive = archive_path(dir);

    write_archive(dir, &archive).map_err(|source| Error::CompressionFailed {
        path: archive.clone(),
        source,
    })?;

    info!("Compressed {} into {}", dir.display(), archive.display());
    Ok(archive)
}

fn write_archive(dir: &Path, archive: &Path) -> io::Result<()> {
    let name = dir.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no directory name", dir.display()),
        )
    })?;

    let file = File::create(archive)?;
    let encoder = GzEncoder::new(file, Compression::new(COMPRESSION_LEVEL));
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);

    builder.append_dir_all(name, dir)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

/// Number of regular files stored in a `.tar.gz` archive.
pub fn count_archive_files(archive: &Path) -> io::Result<usize> {
    let mut archive = Archive::new(GzDecoder::new(File::open(archive)?));
    let mut count = 0;

    for entry in archive.entries()? {
        if entry?.header().entry_type() == EntryType::Regular {
            count += 1;
        }
    }

    Ok(count)
}
