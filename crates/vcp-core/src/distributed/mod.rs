//! Distributed tool execution
//!
//! Workers connect to the hub like any other peer, advertise their tools with
//! `register_tools` and answer `execute_tool` requests with `tool_result`.
//! [`DistributedRouter`] is the hub extension that keeps the worker directory
//! and correlates replies with waiting callers.

mod error;
mod pending;
mod router;
mod worker;

#[cfg(test)]
mod tests;

pub use error::RouterError;
pub use router::DistributedRouter;
pub use worker::{RemoteToolInfo, RemoteWorker, WorkerStatus};
