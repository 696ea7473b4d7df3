//! Streaming utilities for Server-Sent Events (SSE)
//!
//! Contains utilities for turning a stream of serializable events into an
//! SSE response terminated by the `[DONE]` signal.

use crate::error::AppError;
use crate::orchestrator::constants::{SSE_DONE_SIGNAL, SSE_ERROR_PREFIX};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{stream, Stream, StreamExt};
use serde::Serialize;

/// Format one SSE frame
pub fn sse_frame(data: &str) -> String {
    format!("data: {}\n\n", data)
}

/// Create an SSE response from a stream of events
///
/// Each event is serialized as one JSON `data:` frame; a final
/// `data: [DONE]` frame follows the last event.
///
/// # Returns
/// * `Result<Response, AppError>` - SSE HTTP response or error
pub fn create_sse_response<S, T>(events: S) -> Result<Response, AppError>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize,
{
    let frames = events
        .map(|event| match serde_json::to_string(&event) {
            Ok(json) => sse_frame(&json),
            Err(e) => sse_frame(&format!("{} {}", SSE_ERROR_PREFIX, e)),
        })
        .chain(stream::once(async { sse_frame(SSE_DONE_SIGNAL) }))
        .map(Ok::<_, std::io::Error>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(frames))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

/// Parse the JSON payloads out of an SSE body, stopping at `[DONE]`
pub fn parse_sse_frames(body: &str) -> Vec<serde_json::Value> {
    body.split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .take_while(|data| *data != SSE_DONE_SIGNAL)
        .filter_map(|data| serde_json::from_str(data).ok())
        .collect()
}
