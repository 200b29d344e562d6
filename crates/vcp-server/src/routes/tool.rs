//! `POST /tool`

use super::{request_id, respond, run_buffered};
use crate::app::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use serde_json::{Map, Value, json};
use vcp_core::protocol::{self, normalize_key};
use vcp_core::tools::{ToolArgs, ToolCallRequest, ToolCallResult};

/// Run a tool given as JSON (`{tool_name, arguments}`) or as a protocol block
///
/// Always answers 200; failures are reported as `success: false`.
pub async fn call_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let calls = match parse_body(&headers, &body) {
        Ok(calls) => calls,
        Err(message) => {
            tracing::debug!(error = %message, "rejected tool request");
            return Ok(Json(failure_body(&message)));
        }
    };

    let id = request_id(&headers, None);
    let dispatcher = state.dispatcher.clone();
    let body = run_buffered(&state, &id, |sink, token| async move {
        let results = dispatcher.dispatch_all(&calls, &token).await;
        respond(&sink, results_body(&calls, &results)).await;
    })
    .await?;
    Ok(Json(body))
}

fn parse_body(headers: &HeaderMap, body: &str) -> Result<Vec<ToolCallRequest>, String> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"))
        || body.trim_start().starts_with('{');

    if is_json {
        let value: Value =
            serde_json::from_str(body).map_err(|e| format!("Invalid JSON body: {}", e))?;
        return json_call(&value).map(|call| vec![call]);
    }

    let report = protocol::parse_with_diagnostics(body);
    if report.requests.is_empty() {
        return Err(report
            .diagnostics
            .first()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "No tool request found in body".to_string()));
    }
    Ok(report.requests)
}

fn json_call(value: &Value) -> Result<ToolCallRequest, String> {
    let tool_name = ["tool_name", "toolName", "tool"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "tool_name is required".to_string())?;

    let arguments = ["arguments", "args", "params"]
        .iter()
        .find_map(|key| value.get(*key));
    let parameters = match arguments {
        None | Some(Value::Null) => ToolArgs::new(),
        Some(Value::Object(map)) => string_args(map),
        Some(_) => return Err("arguments must be an object".to_string()),
    };

    let mut call = ToolCallRequest::new(tool_name);
    call.parameters = parameters;
    Ok(call)
}

/// Flatten JSON arguments into normalized string parameters
pub(crate) fn string_args(map: &Map<String, Value>) -> ToolArgs {
    map.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (normalize_key(key), text)
        })
        .collect()
}

/// `{success, output, data, error, executionTimeMs}` for one result
pub(crate) fn result_body(result: &ToolCallResult) -> Value {
    json!({
        "success": result.is_success(),
        "output": result.is_success().then(|| result.render_text()),
        "data": result.payload(),
        "error": result.error(),
        "executionTimeMs": result.elapsed_ms(),
    })
}

fn results_body(calls: &[ToolCallRequest], results: &[ToolCallResult]) -> Value {
    if let [result] = results {
        return result_body(result);
    }

    let output = calls
        .iter()
        .zip(results)
        .map(|(call, result)| protocol::format_result(&call.tool_name, result))
        .collect::<Vec<_>>()
        .join("\n");
    json!({
        "success": results.iter().all(ToolCallResult::is_success),
        "output": output,
        "data": results.iter().map(result_body).collect::<Vec<_>>(),
        "error": results.iter().find_map(ToolCallResult::error),
        "executionTimeMs": results.iter().map(ToolCallResult::elapsed_ms).sum::<u64>(),
    })
}

fn failure_body(message: &str) -> Value {
    json!({
        "success": false,
        "output": null,
        "data": null,
        "error": message,
        "executionTimeMs": 0,
    })
}
