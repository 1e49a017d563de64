//! Backup lifecycle: planning the destination, copying the device tree,
//! optional archiving and the final report.

pub mod archive;
pub mod copy;
pub mod executor;
pub mod planner;
pub mod report;

// Re-export main types
pub use executor::{select_mount, BackupExecutor, BackupOutcome};
pub use planner::{BackupMode, BackupPathPlanner};
pub use report::{BackupReport, BackupSummary};
