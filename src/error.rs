//! Error types for kobo-backup

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for backup operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Unsupported OS: {name} {version}")]
    UnsupportedPlatform { name: String, version: String },

    #[error("Device query failed ({command}): {reason}")]
    DeviceQuery { command: String, reason: String },

    #[error("Multiple Kobo devices detected: {}", join_paths(.mounts))]
    AmbiguousDevice { mounts: Vec<PathBuf> },

    #[error("Copy failed at {}: {source}", .path.display())]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compression failed for {}: {source}", .path.display())]
    CompressionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive created but could not remove {}: {source}", .path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Automation error: {reason}")]
    Automation { reason: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for backup operations
pub type Result<T> = std::result::Result<T, Error>;
