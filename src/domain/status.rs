//! Status and update domain types

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Timestamp format used in status snapshots
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Point-in-time view of the update job, built per request
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StatusSnapshot {
    /// `systemctl status` output for the update timer
    pub timer_status: String,
    /// Last lines of the update log
    pub log_tail: String,
    /// Installed HamClock version
    pub hamclock_info: String,
    /// `branch (hash date)` of the source checkout
    pub git_info: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

/// Result of triggering an update in the background
///
/// Serialized as `true` when the script started, otherwise as the error string.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    Started,
    Failed(String),
}

impl UpdateOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

impl Serialize for UpdateOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UpdateOutcome::Started => serializer.serialize_bool(true),
            UpdateOutcome::Failed(message) => serializer.serialize_str(message),
        }
    }
}

/// `/update` response body
#[derive(Clone, Debug, Serialize)]
pub struct UpdateResponse {
    pub success: UpdateOutcome,
}

/// Which pipe a line came from
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// One line of child process output
#[derive(Clone, Debug, Serialize)]
pub struct OutputLine {
    pub timestamp: DateTime<Utc>,
    pub stream: OutputStream,
    pub content: String,
}

impl OutputLine {
    pub fn new(stream: OutputStream, content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stream,
            content: content.into(),
        }
    }

    pub fn stdout(content: impl Into<String>) -> Self {
        Self::new(OutputStream::Stdout, content)
    }

    pub fn stderr(content: impl Into<String>) -> Self {
        Self::new(OutputStream::Stderr, content)
    }
}

/// Progress of a running update script
#[derive(Clone, Debug)]
pub enum UpdateEvent {
    /// A line of merged output
    Line(OutputLine),
    /// The script exited; `None` when killed by a signal
    Exited(Option<i32>),
}
