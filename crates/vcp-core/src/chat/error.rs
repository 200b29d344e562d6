//! Model backend errors

use crate::error::VcpError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Request(String),

    #[error("Model API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Model request timed out after {0} ms")]
    Timeout(u64),

    #[error("No model backend configured")]
    NotConfigured,
}

impl ModelError {
    /// Transient failures worth retrying upstream
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Request(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<ModelError> for VcpError {
    fn from(error: ModelError) -> Self {
        match &error {
            ModelError::Status { status, .. } => VcpError::model_with_status(error.to_string(), *status),
            _ => VcpError::model(error.to_string()),
        }
    }
}
