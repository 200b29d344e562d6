//! Route parsed tool calls to local tools or remote workers

use super::base::ToolArgs;
use super::registry::ToolRegistry;
use super::types::{ToolCallRequest, ToolCallResult, ToolDescriptor};
use crate::error::VcpError;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Source of tools that run outside this process
#[async_trait]
pub trait RemoteToolProvider: Send + Sync {
    /// Whether an online provider currently advertises the tool
    fn has_remote_tool(&self, tool_name: &str) -> bool;

    /// Descriptors of every remotely available tool
    fn remote_tools(&self) -> Vec<ToolDescriptor>;

    /// Call the tool remotely, returning early if `cancel` fires
    async fn call_remote(
        &self,
        tool_name: &str,
        params: &ToolArgs,
        cancel: &CancellationToken,
    ) -> ToolCallResult;
}

/// Dispatches [`ToolCallRequest`]s
///
/// Lookup order is local registry, then the remote provider; anything else
/// fails with a not-found result. Cheap to clone.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    remote: Option<Arc<dyn RemoteToolProvider>>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            remote: None,
        }
    }

    /// Attach a remote tool provider
    pub fn with_remote(mut self, remote: Arc<dyn RemoteToolProvider>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Every tool reachable from this dispatcher, local first
    pub fn available_tools(&self) -> Vec<ToolDescriptor> {
        let mut tools = self.registry.descriptors();
        if let Some(remote) = &self.remote {
            tools.extend(
                remote
                    .remote_tools()
                    .into_iter()
                    .filter(|t| !self.registry.contains(&t.name)),
            );
        }
        tools
    }

    /// Dispatch one request
    ///
    /// Fire-and-forget requests are spawned and acknowledged immediately.
    pub async fn dispatch(&self, request: &ToolCallRequest, cancel: &CancellationToken) -> ToolCallResult {
        if request.fire_and_forget {
            let dispatcher = self.clone();
            let tool_name = request.tool_name.clone();
            let params = request.parameters.clone();
            let cancel = cancel.clone();
            let span = tracing::info_span!("fire_and_forget", tool = %tool_name);
            tokio::spawn(
                async move {
                    let result = dispatcher.execute(&tool_name, &params, &cancel).await;
                    if !result.is_success() {
                        tracing::warn!(error = ?result.error(), "fire-and-forget tool call failed");
                    }
                }
                .instrument(span),
            );
            return ToolCallResult::success(json!({
                "status": "accepted",
                "tool": request.tool_name,
            }));
        }

        self.execute(&request.tool_name, &request.parameters, cancel).await
    }

    /// Dispatch requests in order
    ///
    /// Once `cancel` fires the remaining requests are answered with a
    /// cancelled result without being started.
    pub async fn dispatch_all(
        &self,
        requests: &[ToolCallRequest],
        cancel: &CancellationToken,
    ) -> Vec<ToolCallResult> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.dispatch(request, cancel).await);
        }
        results
    }

    /// Execute a tool by name and wait for it
    #[tracing::instrument(skip(self, params, cancel), fields(tool = %tool_name))]
    pub async fn execute(&self, tool_name: &str, params: &ToolArgs, cancel: &CancellationToken) -> ToolCallResult {
        if cancel.is_cancelled() {
            return ToolCallResult::failure(VcpError::Cancelled.to_string());
        }

        let start_time = Instant::now();

        if let Some(tool) = self.registry.get(tool_name) {
            tracing::debug!("executing local tool");
            let result = tokio::select! {
                result = tool.execute_with_timing(params, cancel.child_token()) => result,
                _ = cancel.cancelled() => ToolCallResult::failure(VcpError::Cancelled.to_string()),
            };
            return result.with_elapsed_ms(start_time.elapsed().as_millis() as u64);
        }

        if let Some(remote) = self.remote.as_ref().filter(|r| r.has_remote_tool(tool_name)) {
            tracing::debug!("forwarding to remote worker");
            return remote
                .call_remote(tool_name, params, cancel)
                .await
                .with_elapsed_ms(start_time.elapsed().as_millis() as u64);
        }

        tracing::warn!("no local or remote provider for tool");
        ToolCallResult::failure(VcpError::tool_not_found(tool_name).to_string())
            .with_elapsed_ms(start_time.elapsed().as_millis() as u64)
    }
}
