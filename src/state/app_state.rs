//! Application state

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::DashboardConfig;

use super::update_guard::UpdateGuard;

/// Application state shared by all handlers
pub struct AppState {
    /// Dashboard configuration, loaded once at startup
    pub config: DashboardConfig,
    /// Server start time
    pub started_at: DateTime<Utc>,
    /// Single-run guard for the update script
    pub update_guard: Arc<UpdateGuard>,
    /// Cancelled on shutdown; running streams stop and kill their child
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        tracing::info!(
            port = config.port,
            branch = %config.branch,
            timer = %config.timer_unit,
            update_script = %config.update_script,
            update_log = %config.update_log.display(),
            "Loaded configuration"
        );

        Self {
            config,
            started_at: Utc::now(),
            update_guard: Arc::new(UpdateGuard::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Seconds since the server started
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
