//! UnifiedError trait implementation for VcpError

use super::types::{UnifiedError, VcpError};

impl UnifiedError for VcpError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "VCP_CONFIG",
            Self::Protocol { .. } => "VCP_PROTOCOL",
            Self::Auth { .. } => "VCP_AUTH",
            Self::Transport { .. } => "VCP_TRANSPORT",
            Self::ToolNotFound { .. } => "VCP_TOOL_NOT_FOUND",
            Self::Tool { .. } => "VCP_TOOL",
            Self::RemoteTimeout { .. } => "VCP_REMOTE_TIMEOUT",
            Self::Cancelled => "VCP_CANCELLED",
            Self::Extension { .. } => "VCP_EXTENSION",
            Self::Model { .. } => "VCP_MODEL",
            Self::Io { .. } => "VCP_IO",
            Self::Json { .. } => "VCP_JSON",
            Self::InvalidInput { .. } => "VCP_INVALID_INPUT",
            Self::NotFound { .. } => "VCP_NOT_FOUND",
            Self::Other { .. } => "VCP_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. } => message,
            Self::Protocol { message } => message,
            Self::Auth { message } => message,
            Self::Transport { message, .. } => message,
            Self::ToolNotFound { tool_name } => tool_name,
            Self::Tool { message, .. } => message,
            Self::RemoteTimeout { .. } => "Remote call timed out",
            Self::Cancelled => "Request was cancelled",
            Self::Extension { message } => message,
            Self::Model { message, .. } => message,
            Self::Io { message } => message,
            Self::Json { message } => message,
            Self::InvalidInput { message } => message,
            Self::NotFound { message } => message,
            Self::Other { message } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            Self::Transport { peer_id, .. } => peer_id.as_deref(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::RemoteTimeout { .. } => true,
            Self::ToolNotFound { .. } => true,
            Self::Model { status_code, .. } => {
                matches!(status_code, Some(429) | Some(500..=599) | None)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(VcpError::config("x").error_code(), "VCP_CONFIG");
        assert_eq!(VcpError::Cancelled.error_code(), "VCP_CANCELLED");
        assert_eq!(
            VcpError::tool_not_found("search").error_code(),
            "VCP_TOOL_NOT_FOUND"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(VcpError::remote_timeout("search", 100).is_retryable());
        assert!(VcpError::model_with_status("busy", 503).is_retryable());
        assert!(!VcpError::model_with_status("bad request", 400).is_retryable());
        assert!(!VcpError::auth("bad key").is_retryable());
    }

    #[test]
    fn test_context_comes_from_config_and_transport() {
        let err = VcpError::config_with_context("bad port", "server.port");
        assert_eq!(err.context(), Some("server.port"));
        assert_eq!(VcpError::transport("send failed", 7).context(), Some("7"));
        assert_eq!(VcpError::io("closed").context(), None);
        assert_eq!(VcpError::invalid_input("missing id").message(), "missing id");
    }

    #[test]
    fn test_display_messages() {
        let err = VcpError::remote_timeout("search_web", 1500);
        assert_eq!(
            err.to_string(),
            "Remote call to 'search_web' timed out after 1500 ms"
        );
        assert_eq!(VcpError::Cancelled.to_string(), "Request was cancelled");
    }
}
