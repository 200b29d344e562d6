//! `GET /status`

use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde_json::{Value, json};

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let extensions = state.hub.list_extensions();
    let uptime = Utc::now() - state.started_at;
    Json(json!({
        "startedAt": state.started_at.to_rfc3339(),
        "uptimeSecs": uptime.num_seconds(),
        "activeRequests": state.requests.len(),
        "extensions": extensions.len(),
        "peers": state.hub.peer_count(),
        "workers": state.router.list_workers().len(),
        "pendingRemoteCalls": state.router.pending_count(),
        "localTools": state.dispatcher.registry().len(),
        "extensionStates": extensions,
    }))
}
