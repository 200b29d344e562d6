//! Router error types

use crate::error::VcpError;
use thiserror::Error;
use uuid::Uuid;

/// Why a remote call did not produce a worker reply
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Router is not attached to a hub")]
    NotInitialized,

    #[error("Failed to send call to worker {worker_id}: {reason}")]
    SendFailed { worker_id: Uuid, reason: String },

    #[error("Remote call to '{tool_name}' timed out after {timeout_ms} ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Worker {0} disconnected before replying")]
    WorkerGone(Uuid),

    #[error("Remote call abandoned: router stopped")]
    Abandoned,
}

impl From<RouterError> for VcpError {
    fn from(error: RouterError) -> Self {
        match error {
            RouterError::ToolNotFound(name) => VcpError::tool_not_found(name),
            RouterError::Timeout {
                tool_name,
                timeout_ms,
            } => VcpError::remote_timeout(tool_name, timeout_ms),
            RouterError::Cancelled => VcpError::Cancelled,
            RouterError::SendFailed { worker_id, reason } => VcpError::transport(reason, worker_id),
            RouterError::WorkerGone(worker_id) => {
                VcpError::transport("worker disconnected", worker_id)
            }
            RouterError::NotInitialized | RouterError::Abandoned => {
                VcpError::extension(error.to_string())
            }
        }
    }
}
