//! Channel-backed response sink

use super::sink::{Finale, ResponseSink};
use crate::error::{VcpError, VcpResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// What a [`ChannelSink`] hands to the HTTP layer
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOutput {
    Frame(String),
    Json(Value),
}

/// A [`ResponseSink`] that forwards writes over an unbounded channel
///
/// The receiving side owns the actual HTTP response. Closing drops the
/// sender, which ends the receiver's stream.
pub struct ChannelSink {
    streaming: bool,
    headers_sent: AtomicBool,
    sender: Mutex<Option<mpsc::UnboundedSender<SinkOutput>>>,
}

impl ChannelSink {
    /// Sink for an event-stream response
    pub fn streaming() -> (Self, mpsc::UnboundedReceiver<SinkOutput>) {
        Self::with_mode(true)
    }

    /// Sink for a single JSON response
    pub fn buffered() -> (Self, mpsc::UnboundedReceiver<SinkOutput>) {
        Self::with_mode(false)
    }

    fn with_mode(streaming: bool) -> (Self, mpsc::UnboundedReceiver<SinkOutput>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            streaming,
            headers_sent: AtomicBool::new(false),
            sender: Mutex::new(Some(tx)),
        };
        (sink, rx)
    }

    /// Record that the HTTP layer already committed the response head
    pub fn mark_headers_sent(&self) {
        self.headers_sent.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .is_none_or(|tx| tx.is_closed())
    }

    fn push(&self, output: SinkOutput) -> VcpResult<()> {
        let guard = self.sender.lock();
        let tx = guard
            .as_ref()
            .ok_or_else(|| VcpError::io("response already closed"))?;
        if matches!(output, SinkOutput::Json(_)) && !self.streaming && self.headers_sent() {
            return Err(VcpError::io("response body already written"));
        }
        tx.send(output)
            .map_err(|_| VcpError::io("response receiver dropped"))?;
        self.mark_headers_sent();
        Ok(())
    }
}

#[async_trait]
impl ResponseSink for ChannelSink {
    fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn headers_sent(&self) -> bool {
        self.headers_sent.load(Ordering::Acquire)
    }

    async fn send_frame(&self, frame: String) -> VcpResult<()> {
        self.push(SinkOutput::Frame(frame))
    }

    async fn send_json(&self, body: Value) -> VcpResult<()> {
        self.push(SinkOutput::Json(body))
    }

    async fn finish_once(&self, finale: Finale) -> bool {
        let mut guard = self.sender.lock();
        let Some(tx) = guard.take() else {
            return false;
        };
        let outputs = match finale {
            Finale::Frames(frames) => frames.into_iter().map(SinkOutput::Frame).collect(),
            Finale::Json(_) if !self.streaming && self.headers_sent() => Vec::new(),
            Finale::Json(body) => vec![SinkOutput::Json(body)],
        };
        for output in outputs {
            if tx.send(output).is_err() {
                break;
            }
            self.mark_headers_sent();
        }
        true
    }

    async fn close(&self) {
        self.sender.lock().take();
    }
}
