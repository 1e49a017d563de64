//! Finding and stopping running watcher processes.

use std::process::Command;
use tracing::{debug, info};

use crate::{Error, Result};

/// Command line fragment that identifies a watcher process
pub const WATCHER_PATTERN: &str = "kobo-backup watch";

/// PIDs of running watchers, excluding the current process.
pub fn find_watchers() -> Result<Vec<i32>> {
    let output = Command::new("pgrep")
        .args(["-f", WATCHER_PATTERN])
        .output()
        .map_err(|e| Error::Automation {
            reason: format!("Failed to run pgrep: {}", e),
        })?;

    // pgrep exits with 1 when nothing matched
    match output.status.code() {
        Some(0) => {}
        Some(1) => return Ok(Vec::new()),
        _ => {
            return Err(Error::Automation {
                reason: format!(
                    "pgrep failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }

    let own_pid = std::process::id() as i32;
    let pids = parse_pids(&String::from_utf8_lossy(&output.stdout))
        .into_iter()
        .filter(|pid| *pid != own_pid)
        .collect::<Vec<_>>();

    debug!("Found watcher processes: {:?}", pids);
    Ok(pids)
}

fn parse_pids(output: &str) -> Vec<i32> {
    output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}

/// Send SIGTERM to every running watcher. Returns how many were signalled.
#[cfg(unix)]
pub fn stop_watchers() -> Result<usize> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let mut stopped = 0;
    for pid in find_watchers()? {
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => {
                info!("Stopped watcher process {}", pid);
                stopped += 1;
            }
            // Exited between pgrep and kill
            Err(Errno::ESRCH) => debug!("Watcher process {} already gone", pid),
            Err(e) => {
                return Err(Error::Automation {
                    reason: format!("Failed to stop process {}: {}", pid, e),
                })
            }
        }
    }
    Ok(stopped)
}

#[cfg(not(unix))]
pub fn stop_watchers() -> Result<usize> {
    Err(Error::Automation {
        reason: "Stopping watchers is only supported on Unix".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pids() {
        assert_eq!(parse_pids("1234\n  5678\n\nnot-a-pid\n"), vec![1234, 5678]);
        assert!(parse_pids("").is_empty());
    }

    #[test]
    fn test_pattern_matches_autostart_command() {
        let exec = format!("/usr/bin/kobo-backup {}", crate::autostart::WATCH_COMMAND);
        assert!(exec.contains(WATCHER_PATTERN));
    }
}
