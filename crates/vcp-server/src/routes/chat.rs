//! `POST /v1/chat/completions`

use super::{REQUEST_ID_HEADER, request_id, run_buffered};
use crate::app::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use vcp_core::chat::{ChatRequest, ToolLoop};
use vcp_core::lifecycle::frames::sse_data;
use vcp_core::lifecycle::{ChannelSink, SinkOutput};

/// OpenAI-compatible chat completion with tool execution
///
/// The request is tracked under its `requestId` (or `x-request-id`) so it
/// can be stopped through `/interrupt`.
pub async fn chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let tool_loop = state
        .tool_loop
        .clone()
        .ok_or_else(|| ApiError::unavailable("No chat upstream configured"))?;
    if request.messages.is_empty() {
        return Err(ApiError::bad_request("messages must not be empty"));
    }

    let id = request_id(&headers, request.request_id.as_deref());
    if request.stream {
        stream_completion(&state, tool_loop, id, request)
    } else {
        buffered_completion(&state, tool_loop, id, request).await
    }
}

fn stream_completion(
    state: &AppState,
    tool_loop: ToolLoop,
    id: String,
    request: ChatRequest,
) -> Result<Response, ApiError> {
    let (sink, rx) = ChannelSink::streaming();
    sink.mark_headers_sent();
    let sink = Arc::new(sink);
    let token = CancellationToken::new();
    let guard = state
        .requests
        .register_guarded(id.clone(), sink.clone(), token.clone(), true);

    let request_id = id.clone();
    tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = tool_loop.run(&request_id, request, sink, token).await {
            tracing::debug!(request_id = %request_id, error = %e, "streamed chat ended with error");
        }
    });

    let frames = UnboundedReceiverStream::new(rx).map(|output| {
        Ok::<_, Infallible>(match output {
            SinkOutput::Frame(frame) => frame,
            SinkOutput::Json(body) => sse_data(&body),
        })
    });

    Response::builder()
        .header(CONTENT_TYPE, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .header(REQUEST_ID_HEADER, id)
        .body(Body::from_stream(frames))
        .map_err(|e| ApiError::internal(e.to_string()))
}

async fn buffered_completion(
    state: &AppState,
    tool_loop: ToolLoop,
    id: String,
    request: ChatRequest,
) -> Result<Response, ApiError> {
    let body = run_buffered(state, &id, |sink, token| {
        let request_id = id.clone();
        async move {
            if let Err(e) = tool_loop.run(&request_id, request, sink, token).await {
                tracing::debug!(request_id = %request_id, error = %e, "chat ended with error");
            }
        }
    })
    .await?;

    let status = if body.get("error").is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, [(REQUEST_ID_HEADER, id)], Json(body)).into_response())
}
