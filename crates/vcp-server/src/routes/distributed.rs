//! Remote tool listing and direct remote calls

use super::tool::{result_body, string_args};
use super::{request_id, respond, run_buffered};
use crate::app::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

/// `GET /distributed/tools`
pub async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "tools": state.router.list_remote_tools(),
        "workers": state.router.list_workers(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCallRequest {
    #[serde(alias = "tool_name")]
    pub tool_name: String,
    #[serde(default, alias = "arguments", alias = "args")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// `POST /distributed/call`
///
/// Routes straight to a worker, bypassing local tools.
pub async fn call_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RemoteCallRequest>,
) -> Result<Json<Value>, ApiError> {
    let tool_name = body.tool_name.trim().to_string();
    if tool_name.is_empty() {
        return Err(ApiError::bad_request("toolName is required"));
    }

    let params = string_args(&body.params);
    let timeout = body
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(state.config.distributed.call_timeout);
    let id = request_id(&headers, body.request_id.as_deref());
    let router = state.router.clone();

    let body = run_buffered(&state, &id, |sink, token| async move {
        let result = router
            .call_remote_tool_cancellable(&tool_name, &params, timeout, &token)
            .await;
        respond(&sink, result_body(&result)).await;
    })
    .await?;
    Ok(Json(body))
}
