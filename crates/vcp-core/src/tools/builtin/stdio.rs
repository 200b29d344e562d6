//! Tools implemented as child processes speaking JSON over stdio
//!
//! The process receives the call parameters as one JSON object on stdin and
//! answers on stdout with either
//! `{"status": "success", "result": ..., "messageForAI": "..."}` or
//! `{"status": "error", "error": "..."}` (`plugin_error` is accepted too).

use crate::config::StdioToolConfig;
use crate::tools::base::{Tool, ToolArgs};
use crate::tools::error::ToolError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
struct PluginReply {
    status: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    plugin_error: Option<String>,
    #[serde(default, rename = "messageForAI")]
    message_for_ai: Option<String>,
}

/// A configured stdio plugin
#[derive(Debug, Clone)]
pub struct StdioPluginTool {
    config: StdioToolConfig,
}

impl StdioPluginTool {
    pub fn new(config: StdioToolConfig) -> Self {
        Self { config }
    }

    async fn run(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ToolError::ExecutionFailed(format!("failed to start '{}': {}", self.config.command, e))
            })?;

        let input = serde_json::to_vec(args)?;
        if let Some(mut stdin) = child.stdin.take() {
            // a plugin may answer and exit without reading all of its input
            let written = async {
                stdin.write_all(&input).await?;
                stdin.shutdown().await
            }
            .await;
            if let Err(e) = written {
                tracing::debug!(tool = %self.config.name, error = %e, "plugin stopped reading stdin");
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match parse_reply(&stdout) {
            Some(reply) => reply_to_value(reply),
            None if output.status.success() => Ok(Value::String(stdout.trim().to_string())),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ToolError::ExecutionFailed(format!(
                    "process exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
        }
    }
}

/// Find the reply object: the whole output, or failing that its last JSON line
fn parse_reply(stdout: &str) -> Option<PluginReply> {
    let trimmed = stdout.trim();
    if let Ok(reply) = serde_json::from_str(trimmed) {
        return Some(reply);
    }
    trimmed
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str(line).ok())
}

fn reply_to_value(reply: PluginReply) -> Result<Value, ToolError> {
    if reply.status.eq_ignore_ascii_case("success") {
        let result = reply.result.unwrap_or(Value::Null);
        return Ok(match reply.message_for_ai {
            Some(message) => json!({ "result": result, "messageForAI": message }),
            None => result,
        });
    }

    let message = reply
        .error
        .or(reply.plugin_error)
        .unwrap_or_else(|| format!("plugin reported status '{}'", reply.status));
    Err(ToolError::ExecutionFailed(message))
}

#[async_trait]
impl Tool for StdioPluginTool {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    fn max_execution_duration(&self) -> Option<Duration> {
        Some(self.config.timeout)
    }

    async fn execute(&self, args: &ToolArgs, cancel: CancellationToken) -> Result<Value, ToolError> {
        tracing::debug!(tool = %self.config.name, command = %self.config.command, "spawning stdio plugin");
        // Dropping the run future drops the child, which kills it.
        tokio::select! {
            result = self.run(args) => result,
            _ = cancel.cancelled() => Err(ToolError::Cancelled),
        }
    }
}
