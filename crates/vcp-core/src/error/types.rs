//! Core error types and traits

use thiserror::Error;

/// Result type alias for VCP operations
pub type VcpResult<T> = Result<T, VcpError>;

/// Unified error trait implemented by [`VcpError`].
///
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Main error type for the VCP hub
#[derive(Error, Debug, Clone)]
pub enum VcpError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Malformed tool-call block
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Bad or missing credential
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Send/receive failure on a peer transport
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        peer_id: Option<String>,
    },

    /// No local or remote provider for a tool
    #[error("Tool not found: {tool_name}")]
    ToolNotFound { tool_name: String },

    /// Tool execution errors
    #[error("Tool error: {tool_name}: {message}")]
    Tool { tool_name: String, message: String },

    /// A pending remote call expired
    #[error("Remote call to '{tool_name}' timed out after {timeout_ms} ms")]
    RemoteTimeout { tool_name: String, timeout_ms: u64 },

    /// Work was interrupted
    #[error("Request was cancelled")]
    Cancelled,

    /// Extension lifecycle or callback failures
    #[error("Extension error: {message}")]
    Extension { message: String },

    /// Upstream model backend errors
    #[error("Model error: {message}")]
    Model {
        message: String,
        status_code: Option<u16>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Generic error with context
    #[error("Error: {message}")]
    Other { message: String },
}

impl From<std::io::Error> for VcpError {
    fn from(error: std::io::Error) -> Self {
        VcpError::io(error.to_string())
    }
}

impl From<serde_json::Error> for VcpError {
    fn from(error: serde_json::Error) -> Self {
        VcpError::json(error.to_string())
    }
}
