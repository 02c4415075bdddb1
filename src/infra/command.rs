//! Command runner
//!
//! Unified child process interface:
//! - captured output with timeout
//! - stdout/stderr merged into one line stream, in arrival order

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::{OutputLine, OutputStream};

/// Merged line channel capacity
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Command runner
pub struct CommandRunner;

/// Command errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    SpawnFailed(#[source] std::io::Error),
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to wait for command: {0}")]
    WaitFailed(#[source] std::io::Error),
}

/// A spawned child whose stdout and stderr are read as one line stream
pub struct MergedChild {
    child: Child,
    lines: mpsc::Receiver<OutputLine>,
}

impl MergedChild {
    /// Next output line, `None` once both pipes are closed
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        self.lines.recv().await
    }

    /// Exit status if the child has already exited
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>, CommandError> {
        self.child.try_wait().map_err(CommandError::WaitFailed)
    }

    /// Wait for the child to exit
    pub async fn wait(&mut self) -> Result<ExitStatus, CommandError> {
        self.child.wait().await.map_err(CommandError::WaitFailed)
    }

    /// Kill the child and reap it
    pub async fn kill(&mut self) -> Result<(), CommandError> {
        self.child.kill().await.map_err(CommandError::WaitFailed)
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

impl CommandRunner {
    /// Run a command and capture its output
    pub async fn run_simple(
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output, CommandError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        tokio::select! {
            result = child => {
                result.map_err(CommandError::SpawnFailed)
            }
            _ = tokio::time::sleep(timeout) => {
                Err(CommandError::Timeout(timeout))
            }
        }
    }

    /// Spawn a command with stdout and stderr merged into one line stream
    ///
    /// Output keeps being drained after the receiver side is dropped, so the
    /// child never blocks on a full pipe.
    pub fn spawn_merged(program: &str, args: &[&str]) -> Result<MergedChild, CommandError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(CommandError::SpawnFailed)?;

        let (tx, lines) = mpsc::channel(LINE_CHANNEL_CAPACITY);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, tx));
        }

        Ok(MergedChild { child, lines })
    }
}

/// Read lines from a pipe and forward them
///
/// Lines are decoded lossily and lose their trailing `\n` / `\r\n`.
async fn forward_lines<R>(pipe: R, stream: OutputStream, tx: mpsc::Sender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    let mut forwarding = true;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if !forwarding {
                    continue;
                }
                let content = String::from_utf8_lossy(&buf);
                let content = content.trim_end_matches(['\n', '\r']);
                if tx.send(OutputLine::new(stream, content)).await.is_err() {
                    forwarding = false;
                }
            }
            Err(e) => {
                warn!(stream = stream.as_str(), error = %e, "Failed to read child output");
                break;
            }
        }
    }
}
