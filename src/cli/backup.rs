//! Backup command implementation.

use anyhow::Result;
use chrono::Local;
use clap::Args;
use std::path::PathBuf;

use crate::backup::{BackupExecutor, BackupOutcome, BackupPathPlanner};
use crate::device::HostLocator;
use crate::notify::DesktopNotifier;

/// Arguments for a backup run
#[derive(Args, Debug, Default)]
pub struct BackupArgs {
    /// Store this backup as a .tar.gz archive
    #[arg(short = 'z', long)]
    pub compress: bool,

    /// Print the backup report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run one backup of the connected reader
pub async fn run(args: BackupArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_ref())?.with_compression(args.compress);

    let outcome = tokio::task::spawn_blocking(move || {
        BackupExecutor::new(&config, &HostLocator, &DesktopNotifier).run()
    })
    .await??;

    for line in outcome_lines(&outcome, args.json)? {
        println!("{}", line);
    }
    Ok(())
}

/// What the operator sees for `outcome`.
pub(crate) fn outcome_lines(outcome: &BackupOutcome, json: bool) -> Result<Vec<String>> {
    let lines = match outcome {
        BackupOutcome::NoDeviceFound => vec!["No Kobo detected.".to_string()],
        BackupOutcome::DuplicateBackupWindow { path } => {
            let taken_at = BackupPathPlanner::backup_time(path)
                .unwrap_or_else(|| Local::now().naive_local());
            vec![format!(
                "A backup of the kobo was already completed at {}. Try again in a minute.",
                taken_at.format("%Y-%m-%d %H:%M")
            )]
        }
        BackupOutcome::Completed(report) if json => vec![serde_json::to_string_pretty(report)?],
        BackupOutcome::Completed(report) => report.lines(),
    };
    Ok(lines)
}
