//! API module
//!
//! HTTP handlers and router assembly

pub mod health;
pub mod pages;
pub mod status;
pub mod update;

use axum::{http::Uri, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the full router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Dashboard page & favicon
        .merge(pages::router())
        // Status snapshot
        .merge(status::router())
        // Update trigger & live stream
        .merge(update::router())
        .merge(health::router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_config(dir: &Path) -> DashboardConfig {
        DashboardConfig {
            update_log: dir.join("hamclock-update.log"),
            html_path: dir.join("update.html"),
            favicon_path: dir.join("favicon.png"),
            hamclock_bin: dir.join("no-hamclock").to_string_lossy().into_owned(),
            repo_dir: dir.to_path_buf(),
            update_script: dir.join("hamclock-update").to_string_lossy().into_owned(),
            command_timeout: Duration::from_secs(5),
            ..DashboardConfig::default()
        }
    }

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

    async fn get(dir: &Path, uri: &str) -> Response {
        let app = router(Arc::new(AppState::new(test_config(dir))));
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap()
    }

    fn content_type(response: &Response) -> String {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn index_serves_configured_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("update.html"), "<html>custom</html>").unwrap();

        let response = get(dir.path(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("text/html"));
        assert_eq!(body_string(response).await, "<html>custom</html>");
    }

    #[tokio::test]
    async fn index_falls_back_to_builtin_page() {
        let dir = tempfile::tempdir().unwrap();

        let response = get(dir.path(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("text/html"));
        assert!(body_string(response).await.contains("EventSource"));
    }

    #[tokio::test]
    async fn favicon_is_png() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("favicon.png"), b"\x89PNG\r\n\x1a\n").unwrap();

        let response = get(dir.path(), "/favicon.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "image/png");
    }

    #[tokio::test]
    async fn missing_favicon_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(dir.path(), "/favicon.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_is_json_with_placeholders() {
        let dir = tempfile::tempdir().unwrap();

        let response = get(dir.path(), "/status").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("application/json"));

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["log_tail"], "No log file found");
        assert!(body["hamclock_info"]
            .as_str()
            .unwrap()
            .starts_with("Error getting version:"));
        assert!(body["git_info"].as_str().unwrap().starts_with("Error"));
        assert!(body["timer_status"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn status_includes_log_tail() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hamclock-update.log"), "started\nfinished\n").unwrap();

        let response = get(dir.path(), "/status").await;
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["log_tail"], "started\nfinished\n");
    }

    #[tokio::test]
    async fn update_with_missing_script_reports_error_string() {
        let dir = tempfile::tempdir().unwrap();

        let response = get(dir.path(), "/update").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("application/json"));

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["success"].is_string());
    }

    #[tokio::test]
    async fn update_with_script_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "sleep 1");

        let response = get(dir.path(), "/update").await;
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn stream_relays_script_output() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "echo 'Pulling master'; echo 'Build complete'");

        let response = get(dir.path(), "/stream").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("text/event-stream"));
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-cache")
        );

        let body = body_string(response).await;
        assert!(body.contains("data: Pulling master\n\n"), "{body}");
        assert!(body.contains("data: Build complete\n\n"), "{body}");
        assert!(body.contains("event: end\ndata: exit code 0\n\n"), "{body}");
    }

    #[tokio::test]
    async fn stream_with_missing_script_sends_error_event() {
        let dir = tempfile::tempdir().unwrap();

        let response = get(dir.path(), "/stream").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.starts_with("data: Error: "), "{body}");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();

        let response = get(dir.path(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["update_running"], false);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let dir = tempfile::tempdir().unwrap();

        let response = get(dir.path(), "/does-not-exist").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "not_found");
    }
}
