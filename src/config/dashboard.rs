//! Dashboard configuration
//!
//! Flat `KEY=value` file (normally `/etc/default/hamclock`), with environment
//! variables of the same name taking precedence.

use std::collections::BTreeMap;
use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use self::constants::*;

/// Configuration load errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Keys that may be overridden from the environment
pub const KNOWN_KEYS: &[&str] = &[
    KEY_PORT,
    KEY_BRANCH,
    KEY_BIND,
    KEY_UPDATE_LOG,
    KEY_HTML,
    KEY_FAVICON,
    KEY_TIMER,
    KEY_HAMCLOCK_BIN,
    KEY_REPO_DIR,
    KEY_UPDATE_SCRIPT,
    KEY_LOG_TAIL_LINES,
    KEY_COMMAND_TIMEOUT,
];

/// Dashboard configuration
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Raw key/value mapping after file + env merge
    pub values: BTreeMap<String, String>,
    /// HTTP listen port
    pub port: u16,
    /// HTTP listen address
    pub bind_addr: String,
    /// Branch the update job tracks
    pub branch: String,
    /// Update job log file
    pub update_log: PathBuf,
    /// Dashboard page
    pub html_path: PathBuf,
    pub favicon_path: PathBuf,
    /// systemd timer unit driving scheduled updates
    pub timer_unit: String,
    /// HamClock binary, queried with `-v`
    pub hamclock_bin: String,
    /// Source checkout used by the update script
    pub repo_dir: PathBuf,
    /// Update script
    pub update_script: String,
    /// Number of log lines in a status snapshot
    pub log_tail_lines: usize,
    /// Timeout for status probe commands
    pub command_timeout: Duration,
}

impl DashboardConfig {
    /// Load from a config file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut values = default_values();

        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "Loading config file");
                values.extend(parse_config(&content));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        for key in KNOWN_KEYS {
            if let Ok(value) = env::var(key) {
                values.insert((*key).to_string(), value);
            }
        }

        Self::from_values(values)
    }

    /// Build typed settings from a raw mapping
    pub fn from_values(values: BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| -> String {
            values
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let port = parse_value(KEY_PORT, &get(KEY_PORT, "8088"))?;
        let log_tail_lines = parse_value(
            KEY_LOG_TAIL_LINES,
            &get(KEY_LOG_TAIL_LINES, &DEFAULT_LOG_TAIL_LINES.to_string()),
        )?;
        let timeout_secs: u64 = parse_value(
            KEY_COMMAND_TIMEOUT,
            &get(KEY_COMMAND_TIMEOUT, &DEFAULT_COMMAND_TIMEOUT_SECS.to_string()),
        )?;

        Ok(Self {
            port,
            bind_addr: get(KEY_BIND, DEFAULT_BIND),
            branch: get(KEY_BRANCH, "master"),
            update_log: get(KEY_UPDATE_LOG, DEFAULT_UPDATE_LOG).into(),
            html_path: get(KEY_HTML, DEFAULT_HTML_PATH).into(),
            favicon_path: get(KEY_FAVICON, DEFAULT_FAVICON_PATH).into(),
            timer_unit: get(KEY_TIMER, DEFAULT_TIMER_UNIT),
            hamclock_bin: get(KEY_HAMCLOCK_BIN, DEFAULT_HAMCLOCK_BIN),
            repo_dir: get(KEY_REPO_DIR, DEFAULT_REPO_DIR).into(),
            update_script: get(KEY_UPDATE_SCRIPT, DEFAULT_UPDATE_SCRIPT),
            log_tail_lines,
            command_timeout: Duration::from_secs(timeout_secs),
            values,
        })
    }

    /// Raw config value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            values: default_values(),
            port: 8088,
            bind_addr: DEFAULT_BIND.to_string(),
            branch: "master".to_string(),
            update_log: DEFAULT_UPDATE_LOG.into(),
            html_path: DEFAULT_HTML_PATH.into(),
            favicon_path: DEFAULT_FAVICON_PATH.into(),
            timer_unit: DEFAULT_TIMER_UNIT.to_string(),
            hamclock_bin: DEFAULT_HAMCLOCK_BIN.to_string(),
            repo_dir: DEFAULT_REPO_DIR.into(),
            update_script: DEFAULT_UPDATE_SCRIPT.to_string(),
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }
}

fn default_values() -> BTreeMap<String, String> {
    BTreeMap::from([
        (KEY_PORT.to_string(), "8088".to_string()),
        (KEY_BRANCH.to_string(), "master".to_string()),
    ])
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Parse `KEY=value` lines
///
/// Blank lines and `#` comments are skipped, values lose surrounding quotes.
pub fn parse_config(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(line = lineno + 1, "Skipping config line without '='");
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        values.insert(key.trim().to_string(), value.to_string());
    }

    values
}

/// Constants
pub mod constants {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const SERVICE_NAME: &str = "hamclock-update-web";

    pub const DEFAULT_CONFIG_PATH: &str = "/etc/default/hamclock";

    pub const KEY_PORT: &str = "HAMCLOCK_UPDATE_PORT";
    pub const KEY_BRANCH: &str = "HAMCLOCK_BRANCH";
    pub const KEY_BIND: &str = "HAMCLOCK_UPDATE_BIND";
    pub const KEY_UPDATE_LOG: &str = "HAMCLOCK_UPDATE_LOG";
    pub const KEY_HTML: &str = "HAMCLOCK_UPDATE_HTML";
    pub const KEY_FAVICON: &str = "HAMCLOCK_FAVICON";
    pub const KEY_TIMER: &str = "HAMCLOCK_UPDATE_TIMER";
    pub const KEY_HAMCLOCK_BIN: &str = "HAMCLOCK_BIN";
    pub const KEY_REPO_DIR: &str = "HAMCLOCK_REPO_DIR";
    pub const KEY_UPDATE_SCRIPT: &str = "HAMCLOCK_UPDATE_SCRIPT";
    pub const KEY_LOG_TAIL_LINES: &str = "HAMCLOCK_LOG_TAIL_LINES";
    pub const KEY_COMMAND_TIMEOUT: &str = "HAMCLOCK_COMMAND_TIMEOUT_SECS";

    pub const DEFAULT_BIND: &str = "0.0.0.0";
    pub const DEFAULT_UPDATE_LOG: &str = "/var/log/hamclock-update.log";
    pub const DEFAULT_HTML_PATH: &str = "/usr/local/sbin/update.html";
    pub const DEFAULT_FAVICON_PATH: &str = "/usr/local/sbin/favicon.png";
    pub const DEFAULT_TIMER_UNIT: &str = "hamclock-update.timer";
    pub const DEFAULT_HAMCLOCK_BIN: &str = "/usr/local/bin/hamclock";
    pub const DEFAULT_REPO_DIR: &str = "/var/cache/hamclock/repo";
    pub const DEFAULT_UPDATE_SCRIPT: &str = "/usr/local/sbin/hamclock-update";

    pub const DEFAULT_LOG_TAIL_LINES: usize = 50;
    pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

    /// SSE keep-alive interval (seconds)
    pub const SSE_KEEP_ALIVE_SECS: u64 = 15;
}
