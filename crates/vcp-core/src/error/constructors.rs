//! Constructor methods for VcpError

use super::types::VcpError;

impl VcpError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a transport error for a specific peer
    pub fn transport(message: impl Into<String>, peer_id: impl ToString) -> Self {
        Self::Transport {
            message: message.into(),
            peer_id: Some(peer_id.to_string()),
        }
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(tool_name: impl Into<String>) -> Self {
        Self::ToolNotFound {
            tool_name: tool_name.into(),
        }
    }

    /// Create a new tool error
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a remote timeout error
    pub fn remote_timeout(tool_name: impl Into<String>, timeout_ms: u64) -> Self {
        Self::RemoteTimeout {
            tool_name: tool_name.into(),
            timeout_ms,
        }
    }

    /// Create a new extension error
    pub fn extension(message: impl Into<String>) -> Self {
        Self::Extension {
            message: message.into(),
        }
    }

    /// Create a new model backend error
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a model backend error carrying the upstream status
    pub fn model_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Model {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
