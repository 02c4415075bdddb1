//! Status probes
//!
//! Each probe returns a display string. Failures are reported inline as an
//! error string so one broken probe never fails the whole snapshot.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DashboardConfig;
use crate::domain::status::{StatusSnapshot, TIMESTAMP_FORMAT};
use crate::infra::CommandRunner;

/// Placeholder when the update log does not exist
pub const NO_LOG_FILE: &str = "No log file found";

const SYSTEMCTL: &str = "systemctl";
const GIT: &str = "git";

/// Assemble a fresh status snapshot
pub async fn snapshot(config: &DashboardConfig) -> StatusSnapshot {
    let (timer_status, log_tail, hamclock_info, git_info) = tokio::join!(
        update_status(config),
        log_tail(&config.update_log, config.log_tail_lines),
        hamclock_info(config),
        git_info(config),
    );

    StatusSnapshot {
        timer_status,
        log_tail,
        hamclock_info,
        git_info,
        timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// `systemctl status` of the update timer
pub async fn update_status(config: &DashboardConfig) -> String {
    unit_status(SYSTEMCTL, &config.timer_unit, config.command_timeout).await
}

async fn unit_status(program: &str, unit: &str, timeout: Duration) -> String {
    match CommandRunner::run_simple(program, &["status", unit], timeout).await {
        Ok(output) => {
            let text = merged_output(&output);
            if output.status.success() {
                text
            } else {
                // systemctl exits non-zero for inactive units, the text is still useful
                debug!(unit = %unit, code = ?output.status.code(), "Unit status returned non-zero");
                format!("Error getting status: {}", text)
            }
        }
        Err(e) => {
            warn!(unit = %unit, error = %e, "Failed to query unit status");
            format!("Error getting status: {}", e)
        }
    }
}

/// Last `lines` lines of the update log
pub async fn log_tail(path: &Path, lines: usize) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => tail_lines(&String::from_utf8_lossy(&bytes), lines),
        Err(e) if e.kind() == ErrorKind::NotFound => NO_LOG_FILE.to_string(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read update log");
            format!("Error reading log: {}", e)
        }
    }
}

/// Keep the last `n` lines, including their line endings
fn tail_lines(content: &str, n: usize) -> String {
    let all: Vec<&str> = content.split_inclusive('\n').collect();
    let start = all.len().saturating_sub(n);
    all[start..].concat()
}

/// Installed HamClock version
///
/// `hamclock -v` prints its version on stderr.
pub async fn hamclock_info(config: &DashboardConfig) -> String {
    match CommandRunner::run_simple(&config.hamclock_bin, &["-v"], config.command_timeout).await {
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if output.status.success() {
                stderr
            } else {
                format!("Error: {}", stderr)
            }
        }
        Err(e) => {
            warn!(bin = %config.hamclock_bin, error = %e, "Failed to query version");
            format!("Error getting version: {}", e)
        }
    }
}

/// `branch (hash date)` of the source checkout
pub async fn git_info(config: &DashboardConfig) -> String {
    let repo = config.repo_dir.to_string_lossy();
    let timeout = config.command_timeout;

    let branch = match CommandRunner::run_simple(
        GIT,
        &["-C", &repo, "branch", "--show-current"],
        timeout,
    )
    .await
    {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        Ok(output) => return format!("Error: {}", String::from_utf8_lossy(&output.stderr).trim()),
        Err(e) => return format!("Error getting git info: {}", e),
    };

    match CommandRunner::run_simple(
        GIT,
        &["-C", &repo, "log", "-1", "--format=%h %ad", "--date=short"],
        timeout,
    )
    .await
    {
        Ok(output) if output.status.success() => {
            format!("{} ({})", branch, String::from_utf8_lossy(&output.stdout).trim())
        }
        Ok(output) => format!("Error: {}", String::from_utf8_lossy(&output.stderr).trim()),
        Err(e) => format!("Error getting git info: {}", e),
    }
}

/// stdout followed by stderr, like `2>&1` for short outputs
fn merged_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
