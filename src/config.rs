//! Persisted user configuration.
//!
//! Stored as TOML in the per-user config directory and written with defaults
//! the first time it is needed. Nothing is cached: every run loads it again.

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::device::DEFAULT_VOLUME_LABEL;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory that receives the `kobo_backup_*` folders and archives
    pub backup_directory: PathBuf,
    /// Store each backup as a `.tar.gz` archive instead of a plain folder
    #[serde(default)]
    pub compression: bool,
    /// Volume label that identifies the device
    #[serde(default = "default_volume_label")]
    pub volume_label: String,
}

fn default_volume_label() -> String {
    DEFAULT_VOLUME_LABEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        let home_dir = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/tmp"));

        Self {
            backup_directory: home_dir.join("Backups").join("kobo"),
            compression: false,
            volume_label: default_volume_label(),
        }
    }
}

impl Config {
    /// Load from the default location, creating it if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load from `path`, writing defaults there first if the file is absent.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| Error::Configuration {
                reason: format!("Failed to read {}: {}", path.display(), e),
            })?;
            toml::from_str(&content).map_err(|e| Error::Configuration {
                reason: format!("Failed to parse {}: {}", path.display(), e),
            })
        } else {
            let config = Self::default();
            config.save_to(path)?;
            info!("Created default configuration at {}", path.display());
            Ok(config)
        }
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Force compression on for this run when `force` is set.
    pub fn with_compression(mut self, force: bool) -> Self {
        self.compression |= force;
        self
    }

    /// `<config dir>/kobo-backup/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "kobo-backup").ok_or_else(|| {
            Error::Configuration {
                reason: "Could not determine config directory".to_string(),
            }
        })?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
