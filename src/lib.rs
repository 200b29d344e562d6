//! VCP hub
//!
//! A tool-call text protocol for LLM output, a real-time message hub with
//! pluggable extensions, distributed tool routing over that hub, and
//! interruptible request tracking, served over HTTP and WebSocket.
//!
//! The work lives in two crates re-exported here:
//!
//! - [`vcp_core`]: protocol codec, hub, extensions, tools, lifecycle registry, chat loop
//! - [`vcp_server`]: axum routes, WebSocket driver, CLI and logging bootstrap

pub use vcp_core;
pub use vcp_server;

pub use vcp_core::{
    DistributedRouter, MessageHub, RequestRegistry, ToolCallRequest, ToolCallResult, ToolDispatcher,
    VcpConfig, VcpError, VcpResult,
};
pub use vcp_server::{AppState, build_router, serve};
