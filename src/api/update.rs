//! Update API
//!
//! GET /update starts the update script in the background,
//! GET /stream starts it and relays its output as SSE

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::stream::Stream;
use std::{convert::Infallible, sync::Arc, time::Duration};

use crate::config::dashboard::constants::SSE_KEEP_ALIVE_SECS;
use crate::domain::{UpdateEvent, UpdateResponse};
use crate::services::update;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/update", get(trigger_update))
        .route("/stream", get(stream_update))
}

/// Start the update script
///
/// `{"success": true}` when it started, otherwise `{"success": "<error>"}`
async fn trigger_update(State(state): State<Arc<AppState>>) -> Json<UpdateResponse> {
    tracing::info!("Update triggered");
    Json(UpdateResponse {
        success: update::run_update(&state).await,
    })
}

/// Start the update script and stream its output
///
/// One `data:` event per line, `data: Error: ...` if it could not start,
/// and a final `end` event carrying the exit code.
async fn stream_update(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("Streaming update triggered");

    let stream = async_stream::stream! {
        match update::start_update(&state) {
            Ok(mut run) => {
                while let Some(event) = run.events.recv().await {
                    match event {
                        UpdateEvent::Line(line) => {
                            yield Ok::<_, Infallible>(Event::default().data(event_data(&line.content)));
                        }
                        UpdateEvent::Exited(code) => {
                            let code = code.map_or_else(|| "none".to_string(), |c| c.to_string());
                            yield Ok(Event::default().event("end").data(format!("exit code {}", code)));
                        }
                    }
                }
            }
            Err(message) => {
                yield Ok(Event::default().data(format!("Error: {}", message)));
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("ping"),
    )
}

/// SSE fields cannot carry `\r`; keep what a terminal would show last
fn event_data(content: &str) -> &str {
    content.rsplit('\r').next().unwrap_or(content)
}
