//! Error types for tool operations

use crate::error::VcpError;

/// Error type for tool operations
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid arguments provided to the tool
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Tool timeout
    #[error("Tool execution timed out after {0} ms")]
    Timeout(u64),

    /// Cancelled
    #[error("Tool execution cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ToolError::InvalidArguments(_) => "TOOL_INVALID_ARGS",
            ToolError::ExecutionFailed(_) => "TOOL_EXEC_FAILED",
            ToolError::Timeout(_) => "TOOL_TIMEOUT",
            ToolError::Cancelled => "TOOL_CANCELLED",
            ToolError::Io(_) => "TOOL_IO_ERROR",
            ToolError::Json(_) => "TOOL_JSON_ERROR",
        }
    }

    /// Convert into the crate error, tagged with the tool that failed
    pub fn into_vcp_error(self, tool_name: &str) -> VcpError {
        match self {
            ToolError::Cancelled => VcpError::Cancelled,
            other => VcpError::tool(tool_name, other.to_string()),
        }
    }
}

impl From<ToolError> for VcpError {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::Cancelled => VcpError::Cancelled,
            other => VcpError::other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    #[test]
    fn test_cancelled_maps_to_cancelled() {
        let err: VcpError = ToolError::Cancelled.into();
        assert!(matches!(err, VcpError::Cancelled));
        assert_eq!(err.error_code(), "VCP_CANCELLED");
    }

    #[test]
    fn test_tool_name_is_kept() {
        let err = ToolError::ExecutionFailed("exit 2".into()).into_vcp_error("HelloWorld");
        assert_eq!(err.to_string(), "Tool error: HelloWorld: Execution failed: exit 2");
        assert_eq!(ToolError::Timeout(5).error_code(), "TOOL_TIMEOUT");
    }
}
