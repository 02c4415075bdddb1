//! Status API
//!
//! GET /status

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::domain::StatusSnapshot;
use crate::services::status;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// Timer status, log tail, version and checkout state, built fresh per request
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    let snapshot = status::snapshot(&state.config).await;
    tracing::debug!(timestamp = %snapshot.timestamp, "Status snapshot assembled");
    Json(snapshot)
}
