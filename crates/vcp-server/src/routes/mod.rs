//! HTTP handlers

pub mod chat;
pub mod distributed;
pub mod interrupt;
pub mod status;
pub mod tool;

use crate::app::AppState;
use crate::error::ApiError;
use axum::http::HeaderMap;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vcp_core::lifecycle::{ChannelSink, ResponseSink, SinkOutput};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id from the body, the `x-request-id` header, or a fresh UUID
pub(crate) fn request_id(headers: &HeaderMap, from_body: Option<&str>) -> String {
    from_body
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|id| !id.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Run `work` as an interruptible request and return the JSON body it produced
///
/// The first body written to the sink wins: normally the one `work` writes,
/// or the interrupt notice if the request was interrupted first.
pub(crate) async fn run_buffered<F, Fut>(
    state: &AppState,
    request_id: &str,
    work: F,
) -> Result<Value, ApiError>
where
    F: FnOnce(Arc<ChannelSink>, CancellationToken) -> Fut,
    Fut: Future<Output = ()>,
{
    let (sink, mut rx) = ChannelSink::buffered();
    let sink = Arc::new(sink);
    let token = CancellationToken::new();
    let guard = state
        .requests
        .register_guarded(request_id, sink.clone(), token.clone(), false);

    work(sink.clone(), token).await;
    drop(guard);
    sink.close().await;

    match rx.recv().await {
        Some(SinkOutput::Json(body)) => Ok(body),
        _ => Err(ApiError::internal("request produced no response")),
    }
}

/// Write a body into a buffered sink, logging if the response already went out
pub(crate) async fn respond(sink: &ChannelSink, body: Value) {
    if let Err(e) = sink.send_json(body).await {
        tracing::debug!(error = %e, "response already written");
    }
}
