//! Model / tool round trips for one chat request

use super::backend::ModelBackend;
use super::error::ModelError;
use super::types::{ChatMessage, ChatRequest};
use crate::error::{VcpError, VcpResult};
use crate::lifecycle::{Finale, ResponseSink};
use crate::lifecycle::frames::{DONE_FRAME, completion, completion_chunk, sse_data};
use crate::protocol;
use crate::tools::{ToolCallRequest, ToolCallResult, ToolDispatcher};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// How a tool loop run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The response was written and closed
    Completed { rounds: u32 },
    /// The token fired; the response is left to whoever cancelled it
    Cancelled,
}

/// Drives a chat request through the model, executing any tool calls it emits
///
/// Each round calls the model, forwards its text to the client, runs the
/// tool-call blocks found in it and feeds the formatted results back as a
/// user turn. Stops when the model emits no calls or after `max_rounds`.
#[derive(Clone)]
pub struct ToolLoop {
    backend: Arc<dyn ModelBackend>,
    dispatcher: ToolDispatcher,
    max_rounds: u32,
}

impl ToolLoop {
    pub fn new(backend: Arc<dyn ModelBackend>, dispatcher: ToolDispatcher, max_rounds: u32) -> Self {
        Self {
            backend,
            dispatcher,
            max_rounds,
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Run to completion, writing the response into `sink`
    ///
    /// Once `cancel` fires nothing more is written. A model failure is
    /// reported to the client through the sink and returned as an error.
    pub async fn run(
        &self,
        request_id: &str,
        request: ChatRequest,
        sink: Arc<dyn ResponseSink>,
        cancel: CancellationToken,
    ) -> VcpResult<LoopOutcome> {
        let span = tracing::info_span!("tool_loop", request_id = %request_id, streaming = request.stream);
        let mut writer = ResponseWriter {
            sink,
            id: format!("chatcmpl-{}", request_id),
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.backend.model_name().to_string()),
            transcript: String::new(),
            cancel: cancel.clone(),
        };

        match self.rounds(&request, &mut writer, &cancel).instrument(span).await {
            Ok(LoopOutcome::Completed { rounds }) => {
                writer.finish().await;
                Ok(LoopOutcome::Completed { rounds })
            }
            Ok(LoopOutcome::Cancelled) => Ok(LoopOutcome::Cancelled),
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "chat request failed");
                writer.fail(&e).await;
                Err(e.into())
            }
        }
    }

    async fn rounds(
        &self,
        request: &ChatRequest,
        writer: &mut ResponseWriter,
        cancel: &CancellationToken,
    ) -> Result<LoopOutcome, ModelError> {
        let mut messages = request.messages.clone();
        let mut rounds = 0;

        loop {
            let turn = request.with_messages(messages.clone());
            let text = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(LoopOutcome::Cancelled),
                reply = self.backend.complete(&turn) => reply?,
            };
            if cancel.is_cancelled() {
                return Ok(LoopOutcome::Cancelled);
            }
            writer.emit(&text).await;

            let calls = protocol::parse(&text);
            if calls.is_empty() {
                return Ok(LoopOutcome::Completed { rounds });
            }
            if rounds >= self.max_rounds {
                tracing::warn!(rounds, pending_calls = calls.len(), "tool round limit reached");
                return Ok(LoopOutcome::Completed { rounds });
            }
            rounds += 1;

            tracing::info!(round = rounds, calls = calls.len(), "executing tool calls");
            let results = self.dispatcher.dispatch_all(&calls, cancel).await;
            if cancel.is_cancelled() {
                return Ok(LoopOutcome::Cancelled);
            }

            let echoed = render_results(&calls, &results);
            writer.emit(&format!("\n{}\n", echoed)).await;

            messages.push(ChatMessage::assistant(text));
            messages.push(ChatMessage::user(echoed));
        }
    }
}

fn render_results(calls: &[ToolCallRequest], results: &[ToolCallResult]) -> String {
    calls
        .iter()
        .zip(results)
        .map(|(call, result)| protocol::format_result(&call.tool_name, result))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes model output in the shape the client asked for
struct ResponseWriter {
    sink: Arc<dyn ResponseSink>,
    id: String,
    model: String,
    transcript: String,
    cancel: CancellationToken,
}

impl ResponseWriter {
    async fn emit(&mut self, text: &str) {
        if self.sink.is_streaming() {
            let chunk = completion_chunk(&self.id, &self.model, Some(text), None);
            self.write_frame(sse_data(&chunk)).await;
        } else {
            self.transcript.push_str(text);
        }
    }

    async fn finish(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let finale = if self.sink.is_streaming() {
            let chunk = completion_chunk(&self.id, &self.model, None, Some("stop"));
            Finale::Frames(vec![sse_data(&chunk), DONE_FRAME.to_string()])
        } else {
            Finale::Json(completion(&self.id, &self.model, &self.transcript, "stop"))
        };
        self.finalize(finale).await;
    }

    async fn fail(&mut self, error: &ModelError) {
        if self.cancel.is_cancelled() {
            return;
        }
        let body = json!({
            "error": {
                "message": error.to_string(),
                "type": "upstream_error",
            }
        });
        let finale = if self.sink.is_streaming() {
            Finale::Frames(vec![sse_data(&body), DONE_FRAME.to_string()])
        } else {
            Finale::Json(body)
        };
        self.finalize(finale).await;
    }

    async fn finalize(&self, finale: Finale) {
        if !self.sink.finish_once(finale).await {
            tracing::debug!(id = %self.id, "response already finalized by an interrupt");
        }
    }

    async fn write_frame(&self, frame: String) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(e) = self.sink.send_frame(frame).await {
            log_write_error(&e);
        }
    }
}

fn log_write_error(error: &VcpError) {
    tracing::debug!(error = %error, "response write failed");
}
