//! Core Tool trait definition

use super::error::ToolError;
use super::types::{ToolCallResult, ToolDescriptor};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Arguments handed to a tool: normalized keys mapped to raw string values
pub type ToolArgs = HashMap<String, String>;

/// A locally executed tool
///
/// Implementations should check `cancel` at their await points; the
/// dispatcher also races the whole call against it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's unique name (e.g., "get_time")
    fn name(&self) -> &str;

    /// Get the tool's description for the model
    fn description(&self) -> &str;

    /// Execute the tool with the given arguments
    async fn execute(&self, args: &ToolArgs, cancel: CancellationToken) -> Result<Value, ToolError>;

    /// Upper bound on a single execution, `None` for no limit
    fn max_execution_duration(&self) -> Option<Duration> {
        None
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description())
    }

    /// Execute the tool with timing and error handling
    ///
    /// Always returns a [`ToolCallResult`]; errors become failed results.
    async fn execute_with_timing(&self, args: &ToolArgs, cancel: CancellationToken) -> ToolCallResult {
        let start_time = Instant::now();
        let outcome = match self.max_execution_duration() {
            Some(limit) => match tokio::time::timeout(limit, self.execute(args, cancel)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ToolError::Timeout(limit.as_millis() as u64)),
            },
            None => self.execute(args, cancel).await,
        };

        let elapsed = start_time.elapsed().as_millis() as u64;
        match outcome {
            Ok(payload) => ToolCallResult::success(payload).with_elapsed_ms(elapsed),
            Err(err) => ToolCallResult::failure(err.to_string()).with_elapsed_ms(elapsed),
        }
    }
}
