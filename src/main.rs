//! kobo-backup
//!
//! Main binary entry point for the command-line interface.

use anyhow::Result;
use clap::Parser;
use kobo_backup::cli::{Cli, Commands};
use kobo_backup::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Watch(args)) => kobo_backup::cli::watch::run(args, cli.config).await,
        None if cli.automation.requested() => kobo_backup::cli::automation::run(cli.automation, cli.config).await,
        None => kobo_backup::cli::backup::run(cli.backup, cli.config).await,
    }
}
