//! HTTP boundary: POST /api/chat streams newline-delimited StreamEvent JSON
//! over a chunked text/plain response; GET /health for liveness.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::error::AppError;
use crate::llm::provider::ChatMessage;
use crate::orchestration::conversation::ChatOrchestrator;
use crate::orchestration::event::StreamEvent;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_chat(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    // Fail fast before any model call.
    let Some(raw_messages) = body.get("messages").filter(|v| v.is_array()) else {
        return bad_request("Invalid request: messages must be an array");
    };
    let messages: Vec<ChatMessage> = match serde_json::from_value(raw_messages.clone()) {
        Ok(messages) => messages,
        Err(e) => return bad_request(format!("Invalid request: {e}")),
    };

    let events = state.orchestrator.run(messages);
    let body = Body::from_stream(events.map(|event| Ok::<_, Infallible>(frame(&event))));
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn bad_request(message: impl Into<String>) -> Response {
    let error = AppError::BadRequest(message.into());
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error.to_string() })),
    )
        .into_response()
}

/// One event per line as compact JSON; a consumer must buffer until it sees
/// the terminating newline.
pub fn frame(event: &StreamEvent) -> Bytes {
    let mut line = serde_json::to_vec(event).unwrap_or_else(|_| {
        br#"{"type":"error","data":"event serialization failed"}"#.to_vec()
    });
    line.push(b'\n');
    Bytes::from(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_terminates_each_event_with_a_newline() {
        let line = frame(&StreamEvent::Done);
        assert_eq!(&line[..], b"{\"type\":\"done\"}\n");
    }

    #[test]
    fn frame_is_compact_single_line_json() {
        let line = frame(&StreamEvent::message_delta("a\nb"));
        let text = std::str::from_utf8(&line).unwrap();
        assert!(text.ends_with('\n'));
        // The embedded newline must stay escaped so one line is one event.
        assert_eq!(text.matches('\n').count(), 1);
    }
}
