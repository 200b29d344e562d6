//! Chat-completion frames shared by streaming responses

use chrono::Utc;
use serde_json::{Value, json};

/// End-of-stream marker
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Text delivered when a request is interrupted
pub const INTERRUPT_NOTICE: &str = "[Request interrupted by user]";

/// Encode a JSON value as one SSE data frame
pub fn sse_data(value: &Value) -> String {
    format!("data: {}\n\n", value)
}

/// A `chat.completion.chunk` carrying `content`
pub fn completion_chunk(
    id: &str,
    model: &str,
    content: Option<&str>,
    finish_reason: Option<&str>,
) -> Value {
    let delta = match content {
        Some(text) => json!({ "content": text }),
        None => json!({}),
    };
    json!({
        "id": id,
        "object": "chat.completion.chunk",
        "created": Utc::now().timestamp(),
        "model": model,
        "choices": [{
            "index": 0,
            "delta": delta,
            "finish_reason": finish_reason,
        }],
    })
}

/// A complete non-streaming `chat.completion`
pub fn completion(id: &str, model: &str, content: &str, finish_reason: &str) -> Value {
    json!({
        "id": id,
        "object": "chat.completion",
        "created": Utc::now().timestamp(),
        "model": model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": finish_reason,
        }],
    })
}

pub(crate) fn interrupt_chunk(request_id: &str) -> Value {
    completion_chunk(
        &format!("chatcmpl-interrupt-{}", request_id),
        "vcp",
        Some(INTERRUPT_NOTICE),
        Some("stop"),
    )
}

pub(crate) fn interrupt_completion(request_id: &str) -> Value {
    let mut body = completion(
        &format!("chatcmpl-interrupt-{}", request_id),
        "vcp",
        INTERRUPT_NOTICE,
        "stop",
    );
    body["interrupted"] = Value::Bool(true);
    body
}
