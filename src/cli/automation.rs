//! Automation flags: managing the login watcher.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::autostart::{find_watchers, stop_watchers, Autostart, AutostartEntry, WATCH_COMMAND};
use crate::device::OsKind;

const LINUX_ONLY: &str =
    "The automation feature is currently only supported on Linux. Exiting....";

/// Automation flags; at most one may be given
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct AutomationArgs {
    /// Back up automatically whenever the reader is connected, now and at every login
    #[arg(short, long)]
    pub auto: bool,

    /// Remove the automatic backup and stop it
    #[arg(short, long)]
    pub cancel: bool,

    /// Stop automatic backups until the next login
    #[arg(short, long)]
    pub disable: bool,

    /// Start automatic backups in this terminal
    #[arg(short, long)]
    pub enable: bool,

    /// Show whether automatic backups are set up and running
    #[arg(short, long)]
    pub status: bool,
}

impl AutomationArgs {
    pub fn requested(&self) -> bool {
        self.auto || self.cancel || self.disable || self.enable || self.status
    }
}

pub async fn run(args: AutomationArgs, config_path: Option<PathBuf>) -> Result<()> {
    if OsKind::current().ok() != Some(OsKind::Linux) {
        println!("{}", LINUX_ONLY);
        return Ok(());
    }

    let autostart = Autostart::for_user()?;

    if args.status {
        status(&autostart)
    } else if args.auto {
        install(&autostart, config_path.as_ref())?;
        run_watcher(config_path.as_ref()).await
    } else if args.disable {
        disable()
    } else if args.enable {
        run_watcher(config_path.as_ref()).await
    } else if args.cancel {
        cancel(&autostart)
    } else {
        Ok(())
    }
}

fn status(autostart: &Autostart) -> Result<()> {
    let running = !find_watchers()?.is_empty();
    let installed = autostart.is_installed();

    for line in status_lines(running, installed) {
        println!("{}", line);
    }
    Ok(())
}

fn status_lines(running: bool, installed: bool) -> Vec<&'static str> {
    let mut lines = vec![if running {
        "Auto backup is currently enabled."
    } else {
        "Auto backup is currently disabled."
    }];

    if installed {
        if !running {
            lines.push("Auto backup will be enabled on restart.");
        }
    } else {
        lines.push("Auto backup is not set up to start on login. Use --auto to set it up.");
    }
    lines
}

fn install(autostart: &Autostart, config_path: Option<&PathBuf>) -> Result<()> {
    let exec = std::env::current_exe().context("Failed to locate the kobo-backup executable")?;
    let working_dir = std::env::current_dir()?;

    let entry = AutostartEntry::watcher(exec, working_dir, config_args(config_path));
    let path = autostart.install(&entry)?;
    println!("Auto backup will start on login ({}).", path.display());
    Ok(())
}

fn disable() -> Result<()> {
    match stop_watchers()? {
        0 => println!("No auto backup is currently running."),
        _ => println!("Auto backup disabled. It will be enabled on restart."),
    }
    Ok(())
}

fn cancel(autostart: &Autostart) -> Result<()> {
    let removed = autostart.remove()?;
    let stopped = stop_watchers()?;

    if removed || stopped > 0 {
        println!("Auto backup cancelled.");
    } else {
        println!("There was no auto backup set up.");
    }
    Ok(())
}

/// Run the watcher as a child process so it shows up under the pattern
/// `find_watchers` looks for.
async fn run_watcher(config_path: Option<&PathBuf>) -> Result<()> {
    let exec = std::env::current_exe().context("Failed to locate the kobo-backup executable")?;

    println!("Auto backup enabled. Press Ctrl-C to stop.");
    info!("Starting watcher {} {}", exec.display(), WATCH_COMMAND);

    let status = tokio::process::Command::new(exec)
        .arg(WATCH_COMMAND)
        .args(config_args(config_path))
        .status()
        .await
        .context("Failed to start the watcher")?;

    if !status.success() {
        anyhow::bail!("Watcher exited with {}", status);
    }
    Ok(())
}

fn config_args(config_path: Option<&PathBuf>) -> Vec<String> {
    config_path
        .map(|path| vec!["--config".to_string(), path.display().to_string()])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_requested() {
        assert!(!AutomationArgs::default().requested());
        let args = AutomationArgs {
            cancel: true,
            ..AutomationArgs::default()
        };
        assert!(args.requested());
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            status_lines(true, true),
            vec!["Auto backup is currently enabled."]
        );
        assert_eq!(
            status_lines(false, true),
            vec![
                "Auto backup is currently disabled.",
                "Auto backup will be enabled on restart."
            ]
        );
        assert_eq!(status_lines(false, false).len(), 2);
    }

    #[test]
    fn test_config_args() {
        assert!(config_args(None).is_empty());
        assert_eq!(
            config_args(Some(&PathBuf::from("/home/reader/kobo.toml"))),
            vec!["--config", "/home/reader/kobo.toml"]
        );
    }
}
