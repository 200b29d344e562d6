//! Configuration model
//!
//! Every section carries `#[serde(default)]`, so a config file only needs the
//! values it wants to change. Durations use humantime strings (`"30s"`, `"30m"`).

use super::logging_config::LoggingConfig;
use super::timeouts;
use crate::error::{VcpError, VcpResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VcpConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub hub: HubConfig,
    pub distributed: DistributedConfig,
    pub lifecycle: LifecycleConfig,
    pub chat: ChatConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6005,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared-secret authentication
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether peers and HTTP callers must present the key
    pub required: bool,
    /// The shared secret
    pub api_key: Option<String>,
}

impl AuthConfig {
    /// Auth configuration that requires the given key
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            required: true,
            api_key: Some(key.into()),
        }
    }

    /// Check a presented credential
    ///
    /// Always true when authentication is disabled.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        if !self.required {
            return true;
        }
        match (self.api_key.as_deref(), presented) {
            (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
            _ => false,
        }
    }
}

/// Message hub timing and endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Path of the WebSocket upgrade endpoint
    pub path: String,
    #[serde(with = "humantime_serde")]
    pub auth_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub heartbeat_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            path: "/hub".to_string(),
            auth_timeout: timeouts::hub::auth_timeout(),
            heartbeat_interval: timeouts::hub::heartbeat_interval(),
            heartbeat_timeout: timeouts::hub::heartbeat_timeout(),
        }
    }
}

/// Distributed tool router timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributedConfig {
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub worker_heartbeat_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self {
            call_timeout: timeouts::distributed::call_timeout(),
            worker_heartbeat_timeout: timeouts::distributed::worker_heartbeat_timeout(),
            sweep_interval: timeouts::distributed::sweep_interval(),
        }
    }
}

/// Active request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    #[serde(with = "humantime_serde")]
    pub request_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            request_ttl: timeouts::lifecycle::request_ttl(),
            sweep_interval: timeouts::lifecycle::sweep_interval(),
        }
    }
}

/// Chat tool loop and upstream model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum model turns that may trigger tool calls per request
    pub max_tool_rounds: u32,
    /// Upstream OpenAI-compatible endpoint; chat is disabled when absent
    pub upstream: Option<UpstreamConfig>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            upstream: None,
        }
    }
}

/// Upstream model endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "timeouts::tools::model_request_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

/// Local tool definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Register the built-in `get_time` tool
    pub builtin_time: bool,
    /// Stdio plugins
    pub stdio: Vec<StdioToolConfig>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            builtin_time: true,
            stdio: Vec::new(),
        }
    }
}

/// A local plugin run as a child process speaking JSON over stdio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StdioToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "timeouts::tools::stdio_plugin_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl VcpConfig {
    /// Validate the configuration
    pub fn validate(&self) -> VcpResult<()> {
        if self.auth.required
            && self
                .auth
                .api_key
                .as_deref()
                .map(str::is_empty)
                .unwrap_or(true)
        {
            return Err(VcpError::config_with_context(
                "auth.required is set but no api_key is configured",
                "auth",
            ));
        }

        if !self.hub.path.starts_with('/') {
            return Err(VcpError::config_with_context(
                format!("hub.path must start with '/': {}", self.hub.path),
                "hub",
            ));
        }

        if self.hub.heartbeat_interval.is_zero() {
            return Err(VcpError::config_with_context(
                "hub.heartbeat_interval must be positive",
                "hub",
            ));
        }

        if self.hub.heartbeat_timeout < self.hub.heartbeat_interval {
            return Err(VcpError::config_with_context(
                "hub.heartbeat_timeout must be at least one heartbeat_interval",
                "hub",
            ));
        }

        if self.lifecycle.sweep_interval.is_zero() || self.distributed.sweep_interval.is_zero() {
            return Err(VcpError::config("sweep intervals must be positive"));
        }

        if self.chat.max_tool_rounds == 0 {
            return Err(VcpError::config_with_context(
                "chat.max_tool_rounds must be at least 1",
                "chat",
            ));
        }

        for tool in &self.tools.stdio {
            if tool.name.trim().is_empty() || tool.command.trim().is_empty() {
                return Err(VcpError::config_with_context(
                    "stdio tools need a name and a command",
                    "tools.stdio",
                ));
            }
        }

        Ok(())
    }
}
