//! HTTP error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vcp_core::error::{UnifiedError, VcpError};

/// An error rendered as `{"error": {"code", "message"}}`
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VCP_INVALID_INPUT", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "VCP_NOT_FOUND", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "VCP_AUTH", "Missing or invalid API key")
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "VCP_UNAVAILABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "VCP_INTERNAL", message)
    }
}

impl From<VcpError> for ApiError {
    fn from(error: VcpError) -> Self {
        let status = match &error {
            VcpError::InvalidInput { .. } | VcpError::Protocol { .. } | VcpError::Json { .. } => {
                StatusCode::BAD_REQUEST
            }
            VcpError::Auth { .. } => StatusCode::UNAUTHORIZED,
            VcpError::NotFound { .. } | VcpError::ToolNotFound { .. } => StatusCode::NOT_FOUND,
            VcpError::RemoteTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            VcpError::Model { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.error_code(), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}
