//! Tool-related type definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Range;

/// A tool call extracted from model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRequest {
    /// Name of the tool to call (never empty)
    pub tool_name: String,
    /// Normalized parameter keys mapped to raw string values
    pub parameters: HashMap<String, String>,
    /// The caller does not wait for the result
    pub fire_and_forget: bool,
    /// Byte range of the whole block in the source text
    pub raw_span: Range<usize>,
}

impl ToolCallRequest {
    /// Create a request with no parameters
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters: HashMap::new(),
            fire_and_forget: false,
            raw_span: 0..0,
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Mark the call as fire-and-forget
    pub fn fire_and_forget(mut self) -> Self {
        self.fire_and_forget = true;
        self
    }

    /// Get a parameter value
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// Outcome of a tool execution
///
/// Immutable once built: use [`ToolCallResult::success`] or
/// [`ToolCallResult::failure`] and read it back through the getters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    success: bool,
    payload: Option<Value>,
    error: Option<String>,
    elapsed_ms: u64,
}

impl ToolCallResult {
    /// Create a successful result
    pub fn success(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
            elapsed_ms: 0,
        }
    }

    /// Set the measured execution time
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Human-readable text for echoing back into the conversation
    ///
    /// String payloads are returned as-is, other JSON values pretty-printed.
    pub fn render_text(&self) -> String {
        if !self.success {
            return self.error.clone().unwrap_or_default();
        }
        match &self.payload {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

/// A tool advertised by a local registry or a remote worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form parameter schema as advertised by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }
}
