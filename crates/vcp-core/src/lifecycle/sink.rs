//! Response sinks

use crate::error::VcpResult;
use async_trait::async_trait;
use serde_json::Value;

/// The last thing written before a response is closed
#[derive(Debug, Clone, PartialEq)]
pub enum Finale {
    /// Stream frames written in order (`data: ...\n\n`)
    Frames(Vec<String>),
    /// A complete JSON body, dropped if a body already went out
    Json(Value),
}

/// Where an in-flight request writes its response
///
/// Implementations must tolerate writes after `close` by returning an error
/// or ignoring them; the registry may close a sink while its request task is
/// still winding down.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Whether the response is an event stream
    fn is_streaming(&self) -> bool;

    /// Whether the status line and headers already went out
    fn headers_sent(&self) -> bool;

    /// Write one raw stream frame (`data: ...\n\n`)
    async fn send_frame(&self, frame: String) -> VcpResult<()>;

    /// Write a complete JSON body
    async fn send_json(&self, body: Value) -> VcpResult<()>;

    /// Write `finale` and close, as one step
    ///
    /// Only the first caller finalizes; returns `false` when the response was
    /// already closed and nothing was written.
    async fn finish_once(&self, finale: Finale) -> bool;

    /// Finish the response; later writes are dropped
    async fn close(&self);
}
