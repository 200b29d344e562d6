//! Distributed tool router extension

use super::error::RouterError;
use super::pending::{PendingCall, PendingCalls};
use super::worker::{RemoteToolInfo, RemoteWorker, WorkerStatus};
use crate::config::DistributedConfig;
use crate::extensions::{Extension, ExtensionError, ExtensionResult};
use crate::hub::{HubApi, Message, MessageType};
use crate::tools::{RemoteToolProvider, ToolArgs, ToolCallResult, ToolDescriptor};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterToolsPayload {
    #[serde(default)]
    server_name: Option<String>,
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultPayload {
    request_id: String,
    status: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ToolResultPayload {
    fn into_result(self) -> ToolCallResult {
        if self.status.eq_ignore_ascii_case("success") {
            return ToolCallResult::success(self.result.unwrap_or(Value::Null));
        }
        let error = match self.error {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => "Remote tool failed".to_string(),
        };
        ToolCallResult::failure(error)
    }
}

/// Routes tool calls to workers connected to the hub
///
/// Workers are hub peers that send `register_tools`. A call picks the online
/// worker advertising the tool (the most recently registered one wins), sends
/// `execute_tool` and waits for the matching `tool_result`.
pub struct DistributedRouter {
    config: DistributedConfig,
    api: OnceCell<HubApi>,
    workers: RwLock<HashMap<Uuid, RemoteWorker>>,
    pending: Mutex<PendingCalls>,
    registration_seq: AtomicU64,
}

impl DistributedRouter {
    pub const ID: &'static str = "distributed_router";

    pub fn new(config: DistributedConfig) -> Self {
        Self {
            config,
            api: OnceCell::new(),
            workers: RwLock::new(HashMap::new()),
            pending: Mutex::new(PendingCalls::default()),
            registration_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DistributedConfig {
        &self.config
    }

    /// Call a remote tool and wait at most `timeout` for the reply
    pub async fn call_remote_tool(
        &self,
        tool_name: &str,
        params: &ToolArgs,
        timeout: Duration,
    ) -> ToolCallResult {
        self.call_remote_tool_cancellable(tool_name, params, timeout, &CancellationToken::new())
            .await
    }

    /// Like [`call_remote_tool`](Self::call_remote_tool) but also returns when `cancel` fires
    #[tracing::instrument(skip(self, params, cancel))]
    pub async fn call_remote_tool_cancellable(
        &self,
        tool_name: &str,
        params: &ToolArgs,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ToolCallResult {
        let started = Instant::now();
        let result = match self.route(tool_name, params, timeout, cancel).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "remote call failed");
                ToolCallResult::failure(e.to_string())
            }
        };
        result.with_elapsed_ms(started.elapsed().as_millis() as u64)
    }

    async fn route(
        &self,
        tool_name: &str,
        params: &ToolArgs,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ToolCallResult, RouterError> {
        if cancel.is_cancelled() {
            return Err(RouterError::Cancelled);
        }
        let api = self.api.get().ok_or(RouterError::NotInitialized)?;
        let worker_id = self
            .select_worker(tool_name)
            .ok_or_else(|| RouterError::ToolNotFound(tool_name.to_string()))?;

        let correlation_id = Uuid::new_v4().to_string();
        let (result_tx, result_rx) = oneshot::channel();
        self.pending.lock().insert(
            correlation_id.clone(),
            PendingCall::new(worker_id, tool_name, Instant::now() + timeout, result_tx),
        );

        let message = Message::new(
            MessageType::ExecuteTool,
            json!({
                "requestId": correlation_id,
                "toolName": tool_name,
                "toolArgs": params,
            }),
        );
        if let Err(e) = api.send_to_peer(worker_id, &message).await {
            self.pending.lock().remove(&correlation_id);
            return Err(RouterError::SendFailed {
                worker_id,
                reason: e.to_string(),
            });
        }
        tracing::debug!(worker = %worker_id, request_id = %correlation_id, "remote call sent");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.pending.lock().remove(&correlation_id);
                Err(RouterError::Cancelled)
            }
            reply = tokio::time::timeout(timeout, result_rx) => match reply {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(_)) => Err(RouterError::Abandoned),
                Err(_) => {
                    self.pending.lock().remove(&correlation_id);
                    Err(RouterError::Timeout {
                        tool_name: tool_name.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    })
                }
            },
        }
    }

    /// Online worker advertising `tool_name`, newest registration first
    fn select_worker(&self, tool_name: &str) -> Option<Uuid> {
        self.workers
            .read()
            .values()
            .filter(|worker| worker.is_online() && worker.advertises(tool_name))
            .max_by_key(|worker| worker.registration_seq)
            .map(|worker| worker.id)
    }

    /// Known workers, oldest registration first
    pub fn list_workers(&self) -> Vec<RemoteWorker> {
        let mut workers: Vec<RemoteWorker> = self.workers.read().values().cloned().collect();
        workers.sort_by_key(|worker| worker.registration_seq);
        workers
    }

    /// Tools reachable right now with the worker that would serve each
    pub fn list_remote_tools(&self) -> Vec<RemoteToolInfo> {
        let workers = self.workers.read();
        let mut chosen: HashMap<&str, &RemoteWorker> = HashMap::new();
        for worker in workers.values().filter(|worker| worker.is_online()) {
            for tool in &worker.advertised_tools {
                let slot = chosen.entry(tool.name.as_str()).or_insert(worker);
                if worker.registration_seq > slot.registration_seq {
                    *slot = worker;
                }
            }
        }

        let mut tools: Vec<RemoteToolInfo> = chosen
            .into_iter()
            .filter_map(|(name, worker)| {
                let tool = worker.advertised_tools.iter().find(|t| t.name == name)?;
                Some(RemoteToolInfo {
                    tool: tool.clone(),
                    worker_id: worker.id,
                    worker_name: worker.name.clone(),
                })
            })
            .collect();
        tools.sort_by(|a, b| a.tool.name.cmp(&b.tool.name));
        tools
    }

    /// Forget a worker and fail its in-flight calls
    pub fn unregister_worker(&self, worker_id: Uuid) -> bool {
        let removed = self.workers.write().remove(&worker_id).is_some();
        if removed {
            tracing::info!(worker = %worker_id, "worker unregistered");
            self.fail_worker_calls(worker_id);
        }
        removed
    }

    /// Number of calls waiting for a worker reply
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Mark silent workers offline and drop calls past their deadline
    ///
    /// Returns the number of workers that went offline.
    pub fn sweep_workers(&self) -> usize {
        let timeout = self.config.worker_heartbeat_timeout;
        let now = Instant::now();
        let mut gone = Vec::new();
        {
            let mut workers = self.workers.write();
            for worker in workers.values_mut().filter(|worker| worker.is_online()) {
                if now.saturating_duration_since(worker.last_seen) > timeout {
                    worker.status = WorkerStatus::Offline;
                    gone.push(worker.id);
                }
            }
        }

        for worker_id in &gone {
            tracing::warn!(worker = %worker_id, "worker heartbeat timeout");
            self.fail_worker_calls(*worker_id);
        }

        let expired = self.pending.lock().drain_expired(now);
        for (request_id, call) in expired {
            tracing::debug!(request_id = %request_id, tool = %call.tool_name, "dropping expired remote call");
        }

        gone.len()
    }

    /// Run [`sweep_workers`](Self::sweep_workers) every `sweep_interval` until `shutdown` fires
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let router: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.cancelled() => break,
                }
                let Some(router) = router.upgrade() else {
                    break;
                };
                let offline = router.sweep_workers();
                if offline > 0 {
                    tracing::info!(offline, "worker sweep");
                }
            }
            tracing::debug!("worker sweeper stopped");
        })
    }

    fn fail_worker_calls(&self, worker_id: Uuid) {
        let calls = self.pending.lock().drain_worker(worker_id);
        for (request_id, call) in calls {
            tracing::debug!(request_id = %request_id, tool = %call.tool_name, "failing call to lost worker");
            call.complete(ToolCallResult::failure(
                RouterError::WorkerGone(worker_id).to_string(),
            ));
        }
    }

    fn register_worker(&self, worker_id: Uuid, data: &Value) -> ExtensionResult<()> {
        let payload: RegisterToolsPayload =
            serde_json::from_value(data.clone()).map_err(|e| ExtensionError::HandlerFailed {
                id: Self::ID.to_string(),
                reason: format!("invalid register_tools payload: {}", e),
            })?;
        let name = payload
            .server_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("worker-{}", &worker_id.simple().to_string()[..8]));
        let tools: Vec<ToolDescriptor> = payload
            .tools
            .into_iter()
            .filter(|tool| !tool.name.trim().is_empty())
            .collect();

        let seq = self.registration_seq.fetch_add(1, Ordering::SeqCst);
        tracing::info!(worker = %worker_id, name = %name, tools = tools.len(), "worker registered");
        self.workers
            .write()
            .insert(worker_id, RemoteWorker::new(worker_id, name, tools, seq));
        Ok(())
    }

    /// Complete a pending call; only the worker it was sent to may answer
    fn complete_call(&self, worker_id: Uuid, data: &Value) -> ExtensionResult<()> {
        let payload: ToolResultPayload =
            serde_json::from_value(data.clone()).map_err(|e| ExtensionError::HandlerFailed {
                id: Self::ID.to_string(),
                reason: format!("invalid tool_result payload: {}", e),
            })?;
        let call = {
            let mut pending = self.pending.lock();
            match pending.worker_of(&payload.request_id) {
                None => {
                    tracing::debug!(request_id = %payload.request_id, "tool_result for unknown request");
                    return Ok(());
                }
                Some(expected) if expected != worker_id => {
                    tracing::warn!(
                        request_id = %payload.request_id,
                        from = %worker_id,
                        expected = %expected,
                        "tool_result from a peer the call was not sent to"
                    );
                    return Ok(());
                }
                Some(_) => pending.remove(&payload.request_id),
            }
        };
        let Some(call) = call else {
            return Ok(());
        };
        if !call.complete(payload.into_result()) {
            tracing::debug!("caller stopped waiting before the reply arrived");
        }
        Ok(())
    }

    fn mark_offline(&self, worker_id: Uuid) {
        let was_worker = match self.workers.write().get_mut(&worker_id) {
            Some(worker) => {
                worker.status = WorkerStatus::Offline;
                true
            }
            None => false,
        };
        if was_worker {
            tracing::info!(worker = %worker_id, "worker offline");
            self.fail_worker_calls(worker_id);
        }
    }

    /// Refresh liveness of a known worker
    fn touch(&self, worker_id: Uuid) {
        if let Some(worker) = self.workers.write().get_mut(&worker_id) {
            worker.touch();
            worker.status = WorkerStatus::Online;
        }
    }
}

#[async_trait]
impl Extension for DistributedRouter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Distributed tool router"
    }

    async fn initialize(&self, api: HubApi) -> ExtensionResult<()> {
        self.api
            .set(api)
            .map_err(|_| ExtensionError::Internal("already initialized".to_string()))
    }

    async fn on_message(&self, message: &Message) -> ExtensionResult<()> {
        let Some(peer_id) = message.source_peer_id else {
            return Ok(());
        };

        match message.message_type {
            MessageType::PeerDisconnected => {
                self.mark_offline(peer_id);
                Ok(())
            }
            MessageType::RegisterTools => self.register_worker(peer_id, &message.data),
            MessageType::WorkerHeartbeat => {
                self.touch(peer_id);
                Ok(())
            }
            MessageType::ToolResult => {
                self.touch(peer_id);
                self.complete_call(peer_id, &message.data)
            }
            _ => {
                self.touch(peer_id);
                Ok(())
            }
        }
    }

    async fn cleanup(&self) -> ExtensionResult<()> {
        let dropped = {
            let mut pending = self.pending.lock();
            let count = pending.len();
            pending.clear();
            count
        };
        if dropped > 0 {
            tracing::info!(dropped, "abandoned pending remote calls");
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteToolProvider for DistributedRouter {
    fn has_remote_tool(&self, tool_name: &str) -> bool {
        self.select_worker(tool_name).is_some()
    }

    fn remote_tools(&self) -> Vec<ToolDescriptor> {
        self.list_remote_tools()
            .into_iter()
            .map(|info| info.tool)
            .collect()
    }

    async fn call_remote(
        &self,
        tool_name: &str,
        params: &ToolArgs,
        cancel: &CancellationToken,
    ) -> ToolCallResult {
        self.call_remote_tool_cancellable(tool_name, params, self.config.call_timeout, cancel)
            .await
    }
}
