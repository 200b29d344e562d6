//! `POST /interrupt`

use crate::app::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptRequest {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl InterruptRequest {
    fn target(&self) -> Option<&str> {
        self.request_id
            .as_deref()
            .or(self.message_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

pub async fn interrupt(
    State(state): State<AppState>,
    Json(request): Json<InterruptRequest>,
) -> Result<Json<Value>, ApiError> {
    let request_id = request
        .target()
        .ok_or_else(|| ApiError::bad_request("requestId or messageId is required"))?;

    if state.requests.interrupt(request_id).await.is_interrupted() {
        Ok(Json(json!({
            "status": "ok",
            "requestId": request_id,
        })))
    } else {
        Err(ApiError::not_found(format!(
            "No active request with id '{}'",
            request_id
        )))
    }
}
