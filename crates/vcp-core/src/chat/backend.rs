//! Model backend interface

use super::error::ModelError;
use super::types::ChatRequest;
use async_trait::async_trait;

/// A language model reached as "send these messages, get this text"
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model name reported in responses when the request names none
    fn model_name(&self) -> &str;

    /// Run one non-streaming completion and return the assistant text
    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError>;
}
