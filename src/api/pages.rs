//! Static pages
//!
//! GET /, GET /favicon.png

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::io::ErrorKind;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Served when the configured page is not installed
const BUILTIN_PAGE: &str = include_str!("../../assets/update.html");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/favicon.png", get(favicon))
}

/// Dashboard page
async fn index(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let path = &state.config.html_path;
    match tokio::fs::read_to_string(path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Page not installed, serving built-in page");
            Ok(Html(BUILTIN_PAGE.to_string()))
        }
        Err(e) => Err(ApiError::internal(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

async fn favicon(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let path = &state.config.favicon_path;
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::not_found("favicon.png")),
        Err(e) => Err(ApiError::internal(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}
