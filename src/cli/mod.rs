//! Command-line interface for kobo-backup.
//!
//! Running without flags backs up the connected reader. The automation flags
//! manage the login watcher, which is itself this binary running the hidden
//! `watch` subcommand.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

pub mod automation;
pub mod backup;
pub mod watch;

/// kobo-backup - back up your Kobo e-reader over USB
#[derive(Parser)]
#[command(name = "kobo-backup")]
#[command(about = "Detects a connected Kobo e-reader and copies it to a timestamped backup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(flatten)]
    pub automation: automation::AutomationArgs,

    #[command(flatten)]
    pub backup: backup::BackupArgs,

    /// Use this configuration file instead of the per-user one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch for the reader and back it up on every attach
    #[command(hide = true)]
    Watch(watch::WatchArgs),
}

/// Load the configuration from `path`, or from the per-user location.
pub(crate) fn load_config(path: Option<&PathBuf>) -> crate::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flags_runs_backup() {
        let cli = Cli::try_parse_from(["kobo-backup"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.automation.requested());
        assert!(!cli.backup.compress);
        assert!(!cli.backup.json);
    }

    #[test]
    fn test_automation_flags_are_exclusive() {
        let cli = Cli::try_parse_from(["kobo-backup", "-s"]).unwrap();
        assert!(cli.automation.status);
        assert!(cli.automation.requested());

        assert!(Cli::try_parse_from(["kobo-backup", "-a", "-c"]).is_err());
        assert!(Cli::try_parse_from(["kobo-backup", "--enable", "--disable"]).is_err());
    }

    #[test]
    fn test_backup_flags() {
        let cli = Cli::try_parse_from(["kobo-backup", "-z", "--json", "-v"]).unwrap();
        assert!(cli.backup.compress);
        assert!(cli.backup.json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_watch_subcommand() {
        let cli =
            Cli::try_parse_from(["kobo-backup", "watch", "--config", "/tmp/k.toml"]).unwrap();
        match cli.command {
            Some(Commands::Watch(args)) => assert_eq!(args.interval, 2),
            None => panic!("expected watch subcommand"),
        }
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.toml")));

        let cli = Cli::try_parse_from(["kobo-backup", "watch", "--interval", "5"]).unwrap();
        match cli.command {
            Some(Commands::Watch(args)) => assert_eq!(args.interval, 5),
            None => panic!("expected watch subcommand"),
        }
    }
}
