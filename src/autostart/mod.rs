//! Automatic backups on Linux desktops.
//!
//! A freedesktop autostart entry launches the watcher (`kobo-backup watch`)
//! at login. The watcher polls for the device and runs a backup on every
//! attach. This module writes and removes that entry and finds or stops
//! running watchers.

use directories::BaseDirs;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{Error, Result};

pub mod process;
pub mod watcher;

pub use process::{find_watchers, stop_watchers, WATCHER_PATTERN};
pub use watcher::{AttachDetector, Watcher};

/// File name of the autostart entry
pub const DESKTOP_FILE_NAME: &str = "auto_kobo_backup.desktop";

/// Subcommand the autostart entry launches
pub const WATCH_COMMAND: &str = "watch";

/// Contents of the `[Desktop Entry]` that starts the watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutostartEntry {
    /// Executable to launch
    pub exec: PathBuf,
    /// Arguments after the executable
    pub args: Vec<String>,
    /// Working directory of the launched process
    pub working_dir: PathBuf,
}

impl AutostartEntry {
    /// Entry that runs `<exec> watch` plus `extra_args`.
    pub fn watcher(exec: PathBuf, working_dir: PathBuf, extra_args: Vec<String>) -> Self {
        let mut args = vec![WATCH_COMMAND.to_string()];
        args.extend(extra_args);
        Self {
            exec,
            args,
            working_dir,
        }
    }

    /// Render the `.desktop` file.
    pub fn render(&self) -> String {
        let exec = std::iter::once(self.exec.display().to_string())
            .chain(self.args.iter().cloned())
            .map(|arg| quote_exec_arg(&arg))
            .collect::<Vec<_>>()
            .join(" ");

        let mut entry = String::new();
        entry.push_str("[Desktop Entry]\n");
        entry.push_str("Type=Application\n");
        entry.push_str("Name=Auto Kobo Backup\n");
        entry.push_str("Comment=Automatically backup your Kobo\n");
        entry.push_str(&format!("Path={}\n", self.working_dir.display()));
        entry.push_str(&format!("Exec={}\n", exec));
        entry.push_str("StartupNotify=true\n");
        entry.push_str("X-GNOME-Autostart-enabled=true\n");
        entry.push_str("X-GNOME-Autostart-Delay=0\n");
        entry
    }
}

/// Quote an `Exec` argument when it holds reserved characters.
fn quote_exec_arg(arg: &str) -> String {
    const RESERVED: &[char] = &[' ', '\t', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(', ')', '`'];

    if !arg.is_empty() && !arg.contains(RESERVED) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// The user's autostart directory
#[derive(Debug, Clone)]
pub struct Autostart {
    dir: PathBuf,
}

impl Autostart {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `$XDG_CONFIG_HOME/autostart`, usually `~/.config/autostart`.
    pub fn for_user() -> Result<Self> {
        let dirs = BaseDirs::new().ok_or_else(|| Error::Automation {
            reason: "Could not determine home directory".to_string(),
        })?;
        Ok(Self::new(dirs.config_dir().join("autostart")))
    }

    pub fn desktop_file(&self) -> PathBuf {
        self.dir.join(DESKTOP_FILE_NAME)
    }

    pub fn is_installed(&self) -> bool {
        self.desktop_file().is_file()
    }

    /// Write the entry, replacing any earlier one.
    pub fn install(&self, entry: &AutostartEntry) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.desktop_file();
        fs::write(&path, entry.render())?;

        info!("Created autostart entry {}", path.display());
        Ok(path)
    }

    /// Remove the entry. Returns `false` if there was none.
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(self.desktop_file()) {
            Ok(()) => {
                info!("Removed autostart entry {}", self.desktop_file().display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entry() -> AutostartEntry {
        AutostartEntry::watcher(
            PathBuf::from("/usr/local/bin/kobo-backup"),
            PathBuf::from("/home/reader"),
            vec![],
        )
    }

    #[test]
    fn test_render_desktop_entry() {
        assert_eq!(
            entry().render(),
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=Auto Kobo Backup\n\
             Comment=Automatically backup your Kobo\n\
             Path=/home/reader\n\
             Exec=/usr/local/bin/kobo-backup watch\n\
             StartupNotify=true\n\
             X-GNOME-Autostart-enabled=true\n\
             X-GNOME-Autostart-Delay=0\n"
        );
    }

    #[test]
    fn test_exec_quotes_paths_with_spaces() {
        let entry = AutostartEntry::watcher(
            PathBuf::from("/opt/Kobo Tools/kobo-backup"),
            PathBuf::from("/home/reader"),
            vec!["--config".to_string(), "/home/reader/my kobo.toml".to_string()],
        );
        assert!(entry.render().contains(
            "Exec=\"/opt/Kobo Tools/kobo-backup\" watch --config \"/home/reader/my kobo.toml\"\n"
        ));
    }

    #[test]
    fn test_quote_exec_arg_escapes() {
        assert_eq!(quote_exec_arg("plain"), "plain");
        assert_eq!(quote_exec_arg(""), "\"\"");
        assert_eq!(quote_exec_arg("a$b"), "\"a\\$b\"");
    }

    #[test]
    fn test_install_and_remove() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let autostart = Autostart::new(temp_dir.path().join("autostart"));

        assert!(!autostart.is_installed());
        assert!(!autostart.remove()?);

        let path = autostart.install(&entry())?;
        assert_eq!(path, temp_dir.path().join("autostart").join(DESKTOP_FILE_NAME));
        assert!(autostart.is_installed());
        assert_eq!(fs::read_to_string(&path)?, entry().render());

        assert!(autostart.remove()?);
        assert!(!autostart.is_installed());
        Ok(())
    }
}
