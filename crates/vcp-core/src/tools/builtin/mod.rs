//! Tools shipped with the hub

mod stdio;
mod time;

pub use stdio::StdioPluginTool;
pub use time::GetTimeTool;

use super::registry::ToolRegistry;
use crate::config::ToolsConfig;
use std::sync::Arc;

/// Build the local registry described by the tools configuration
pub fn registry_from_config(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    if config.builtin_time {
        registry.register(Arc::new(GetTimeTool::new()));
    }
    for plugin in &config.stdio {
        registry.register(Arc::new(StdioPluginTool::new(plugin.clone())));
    }
    tracing::info!(tools = ?registry.tool_names(), "local tools registered");
    registry
}
