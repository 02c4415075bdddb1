//! Update script execution
//!
//! The script always runs in a background task that owns the child and the
//! run permit, so it completes even if the HTTP client goes away. Callers get
//! a channel of output lines followed by the exit code.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::domain::{UpdateEvent, UpdateOutcome};
use crate::infra::{CommandRunner, MergedChild};
use crate::services::status;
use crate::state::{AppState, UpdatePermit};

/// Message when a second update is requested
pub const ALREADY_RUNNING: &str = "Update already in progress";

/// A started update script
pub struct UpdateRun {
    /// Child process id
    pub pid: Option<u32>,
    /// Exit code if the script had already exited right after spawn
    pub early_exit: Option<i32>,
    /// Merged output lines, then a final `Exited`
    pub events: mpsc::UnboundedReceiver<UpdateEvent>,
}

/// Start the update script in the background
///
/// Fails with a display message if an update is already running or the
/// script cannot be spawned.
pub fn start_update(state: &Arc<AppState>) -> Result<UpdateRun, String> {
    let permit = state
        .update_guard
        .try_acquire()
        .ok_or_else(|| ALREADY_RUNNING.to_string())?;

    let script = &state.config.update_script;
    let mut child = CommandRunner::spawn_merged(script, &[]).map_err(|e| {
        error!(script = %script, error = %e, "Failed to start update script");
        e.to_string()
    })?;

    let early_exit = match child.try_status() {
        Ok(Some(status)) => Some(status.code().unwrap_or(-1)),
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Failed to poll update script");
            None
        }
    };

    let pid = child.id();
    info!(script = %script, pid = ?pid, "Update process started");

    let (tx, events) = mpsc::unbounded_channel();
    tokio::spawn(drive_update(child, tx, permit, state.shutdown.clone()));

    Ok(UpdateRun {
        pid,
        early_exit,
        events,
    })
}

/// Relay output until the script exits, then report the exit code
async fn drive_update(
    mut child: MergedChild,
    tx: mpsc::UnboundedSender<UpdateEvent>,
    permit: UpdatePermit,
    shutdown: tokio_util::sync::CancellationToken,
) {
    loop {
        tokio::select! {
            line = child.next_line() => match line {
                Some(line) => {
                    info!(stream = line.stream.as_str(), "update: {}", line.content);
                    // client may be gone, keep draining
                    let _ = tx.send(UpdateEvent::Line(line));
                }
                None => break,
            },
            _ = shutdown.cancelled() => {
                warn!("Shutdown requested, killing update script");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill update script");
                }
                break;
            }
        }
    }

    let status = child.wait().await;
    drop(permit);

    match status {
        Ok(status) => {
            let code = status.code();
            if status.success() {
                info!(exit_code = ?code, "Update script finished");
            } else {
                warn!(exit_code = ?code, "Update script failed");
            }
            let _ = tx.send(UpdateEvent::Exited(code));
        }
        Err(e) => {
            error!(error = %e, "Failed to wait for update script");
            let _ = tx.send(UpdateEvent::Exited(None));
        }
    }
}

/// Trigger an update without following its output
pub async fn run_update(state: &Arc<AppState>) -> UpdateOutcome {
    let version = status::hamclock_info(&state.config).await;
    if version.starts_with("Error") {
        error!(version = %version, "Failed to read current version");
    } else {
        info!("Current version: {}", version);
    }

    match start_update(state) {
        Ok(UpdateRun {
            early_exit: Some(code),
            ..
        }) if code != 0 => {
            UpdateOutcome::failed(format!("Update process failed to start: {}", code))
        }
        Ok(_) => UpdateOutcome::Started,
        Err(message) => UpdateOutcome::Failed(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("hamclock-update");
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh").unwrap();
            writeln!(file, "{}", body).unwrap();
            file.sync_all().unwrap();
        }
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn state_with_script(dir: &Path, script: &Path) -> Arc<AppState> {
        Arc::new(AppState::new(DashboardConfig {
            update_script: script.to_string_lossy().into_owned(),
            hamclock_bin: dir.join("no-hamclock").to_string_lossy().into_owned(),
            ..DashboardConfig::default()
        }))
    }

    #[tokio::test]
    async fn test_start_update_relays_output_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo fetching; echo building 1>&2; exit 2");
        let state = state_with_script(dir.path(), &script);

        let mut run = start_update(&state).unwrap();
        let mut lines = Vec::new();
        let mut exit = None;
        while let Some(event) = run.events.recv().await {
            match event {
                UpdateEvent::Line(line) => lines.push(line.content),
                UpdateEvent::Exited(code) => exit = Some(code),
            }
        }

        assert!(lines.contains(&"fetching".to_string()));
        assert!(lines.contains(&"building".to_string()));
        assert_eq!(exit, Some(Some(2)));
        assert!(!state.update_guard.is_running());
    }

    #[tokio::test]
    async fn test_second_update_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "sleep 1");
        let state = state_with_script(dir.path(), &script);

        let mut run = start_update(&state).unwrap();
        assert!(matches!(start_update(&state), Err(msg) if msg == ALREADY_RUNNING));

        while run.events.recv().await.is_some() {}
        assert!(!state.update_guard.is_running());
    }

    #[tokio::test]
    async fn test_run_update_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_script(dir.path(), &dir.path().join("missing-script"));

        let outcome = run_update(&state).await;
        assert!(!outcome.is_started());
        assert!(!state.update_guard.is_running());
    }

    #[tokio::test]
    async fn test_run_update_started() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "sleep 1");
        let state = state_with_script(dir.path(), &script);

        assert_eq!(run_update(&state).await, UpdateOutcome::Started);
        assert!(state.update_guard.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_kills_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "sleep 30");
        let state = state_with_script(dir.path(), &script);

        let mut run = start_update(&state).unwrap();
        state.shutdown.cancel();

        let mut exit = None;
        while let Some(event) = run.events.recv().await {
            if let UpdateEvent::Exited(code) = event {
                exit = Some(code);
            }
        }
        // killed by signal
        assert_eq!(exit, Some(None));
    }
}
