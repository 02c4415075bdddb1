//! Health check API
//!
//! GET /health

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::dashboard::constants::{SERVICE_NAME, VERSION};
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    started_at: String,
    uptime_secs: i64,
    update_running: bool,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// Liveness plus whether an update script is currently running
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: VERSION,
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: state.uptime_secs(),
        update_running: state.update_guard.is_running(),
    })
}
