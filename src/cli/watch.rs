//! The watcher process started at login.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use crate::autostart::Watcher;
use crate::backup::BackupOutcome;
use crate::device::HostLocator;
use crate::notify::DesktopNotifier;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between device checks
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

/// Poll for the reader until interrupted, backing it up on every attach
pub async fn run(args: WatchArgs, config_path: Option<PathBuf>) -> Result<()> {
    info!("Watching for the reader every {}s", args.interval);

    let mut watcher = Watcher::new(Box::new(HostLocator), Box::new(DesktopNotifier));
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Watcher stopped");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        // Reloaded on every poll so edits apply without restarting the watcher
        let config = match super::load_config(config_path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                continue;
            }
        };

        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = watcher.poll(&config);
            (watcher, result)
        })
        .await?;
        watcher = returned;

        match result {
            Ok(Some(BackupOutcome::Completed(report))) => {
                for line in report.lines() {
                    info!("{}", line);
                }
            }
            Ok(Some(outcome)) => info!("No backup taken: {:?}", outcome),
            Ok(None) => {}
            Err(e) => error!("Backup failed: {}", e),
        }
    }
}
