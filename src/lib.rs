//! # kobo-backup
//!
//! Backs up a Kobo e-reader connected over USB to a timestamped local folder.
//!
//! ## Features
//!
//! - **Device discovery**: finds the reader by volume label on Linux
//!   (`lsblk`), macOS (`df`) and Windows (CIM)
//! - **Backups**: one `kobo_backup_<YYYY-MM-DD_HH-MM>` folder per run, at most
//!   one per minute, optionally packed into a `.tar.gz`
//! - **Reports**: file count and size of the new and previous backup
//! - **Automation**: a login watcher that backs up on every attach (Linux)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kobo_backup::backup::{BackupExecutor, BackupOutcome};
//! use kobo_backup::config::Config;
//! use kobo_backup::device::HostLocator;
//! use kobo_backup::notify::DesktopNotifier;
//!
//! # fn main() -> kobo_backup::Result<()> {
//! let config = Config::load()?;
//! let executor = BackupExecutor::new(&config, &HostLocator, &DesktopNotifier);
//!
//! if let BackupOutcome::Completed(report) = executor.run()? {
//!     for line in report.lines() {
//!         println!("{}", line);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod autostart;
pub mod backup;
pub mod cli;
pub mod config;
pub mod device;
mod error;
pub mod logging;
pub mod notify;
pub mod size;

// Re-export commonly used types
pub use backup::{BackupExecutor, BackupOutcome, BackupReport};
pub use config::Config;
pub use device::{DeviceLocator, HostLocator, OsKind, SystemInfo};
pub use error::{Error, Result};
pub use notify::{DesktopNotifier, Notifier};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
