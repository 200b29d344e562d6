//! In-flight remote calls awaiting a worker reply

use crate::tools::ToolCallResult;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

/// A call sent to a worker and not yet answered
#[derive(Debug)]
pub(crate) struct PendingCall {
    pub worker_id: Uuid,
    pub tool_name: String,
    pub deadline: Instant,
    result_slot: oneshot::Sender<ToolCallResult>,
}

impl PendingCall {
    pub fn new(
        worker_id: Uuid,
        tool_name: impl Into<String>,
        deadline: Instant,
        result_slot: oneshot::Sender<ToolCallResult>,
    ) -> Self {
        Self {
            worker_id,
            tool_name: tool_name.into(),
            deadline,
            result_slot,
        }
    }

    /// Hand the result to the waiting caller
    ///
    /// Returns false if the caller already gave up.
    pub fn complete(self, result: ToolCallResult) -> bool {
        self.result_slot.send(result).is_ok()
    }
}

/// Pending calls keyed by correlation id
#[derive(Debug, Default)]
pub(crate) struct PendingCalls {
    calls: HashMap<String, PendingCall>,
}

impl PendingCalls {
    pub fn insert(&mut self, correlation_id: String, call: PendingCall) {
        self.calls.insert(correlation_id, call);
    }

    pub fn remove(&mut self, correlation_id: &str) -> Option<PendingCall> {
        self.calls.remove(correlation_id)
    }

    /// Worker a pending call was routed to
    pub fn worker_of(&self, correlation_id: &str) -> Option<Uuid> {
        self.calls.get(correlation_id).map(|call| call.worker_id)
    }

    /// Remove every call routed to `worker_id`
    pub fn drain_worker(&mut self, worker_id: Uuid) -> Vec<(String, PendingCall)> {
        let ids: Vec<String> = self
            .calls
            .iter()
            .filter(|(_, call)| call.worker_id == worker_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.into_iter()
            .filter_map(|id| self.calls.remove(&id).map(|call| (id, call)))
            .collect()
    }

    /// Remove every call whose deadline has passed
    pub fn drain_expired(&mut self, now: Instant) -> Vec<(String, PendingCall)> {
        let ids: Vec<String> = self
            .calls
            .iter()
            .filter(|(_, call)| call.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        ids.into_iter()
            .filter_map(|id| self.calls.remove(&id).map(|call| (id, call)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }
}
