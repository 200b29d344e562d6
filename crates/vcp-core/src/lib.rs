//! VCP Hub Core Library
//!
//! This crate provides the core functionality of the VCP hub: the tool-call
//! text protocol, the real-time message hub with its extensions, distributed
//! tool routing, request lifecycle control and the chat tool loop.

pub mod chat;
pub mod config;
pub mod distributed;
pub mod error;
pub mod extensions;
pub mod hub;
pub mod lifecycle;
pub mod protocol;
pub mod tools;

// Re-export commonly used types
pub use chat::{ChatMessage, ChatRequest, ModelBackend, OpenAiBackend, ToolLoop};
pub use config::{ConfigLoader, VcpConfig};
pub use distributed::{DistributedRouter, RemoteWorker, WorkerStatus};
pub use error::{VcpError, VcpResult};
pub use extensions::{Extension, ExtensionHost, LogForwarder};
pub use hub::{HubApi, Message, MessageHub, MessageType, PeerKind};
pub use lifecycle::{InterruptOutcome, RequestRegistry, ResponseSink};
pub use protocol::ParseReport;
pub use tools::{Tool, ToolCallRequest, ToolCallResult, ToolDispatcher, ToolRegistry};
