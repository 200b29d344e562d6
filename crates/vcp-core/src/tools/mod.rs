//! Local tools and tool-call dispatch

pub mod base;
pub mod builtin;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod types;


pub use base::{Tool, ToolArgs};
pub use builtin::{GetTimeTool, StdioPluginTool, registry_from_config};
pub use dispatcher::{RemoteToolProvider, ToolDispatcher};
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use types::{ToolCallRequest, ToolCallResult, ToolDescriptor};
