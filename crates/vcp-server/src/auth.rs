//! Shared-secret check for HTTP routes

use crate::app::AppState;
use crate::error::ApiError;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Reject requests without the configured key when auth is required
///
/// The key is read from `Authorization: Bearer <key>` or `x-api-key`.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth = &state.config.auth;
    if !auth.required || auth.verify(presented_key(request.headers())) {
        return next.run(request).await;
    }
    tracing::warn!(path = %request.uri().path(), "rejected request with bad credentials");
    ApiError::unauthorized().into_response()
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return value.strip_prefix("Bearer ").map(str::trim);
    }
    headers.get("x-api-key").and_then(|v| v.to_str().ok())
}
