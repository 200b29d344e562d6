//! Remote worker directory entries

use crate::tools::ToolDescriptor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Online,
    Offline,
}

/// A peer that advertised tools
///
/// Goes offline on heartbeat timeout or disconnect but stays listed until
/// explicitly unregistered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWorker {
    /// Same as the worker's hub peer id
    pub id: Uuid,
    pub name: String,
    pub status: WorkerStatus,
    pub advertised_tools: Vec<ToolDescriptor>,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    /// Monotonic registration order, newest wins
    #[serde(skip)]
    pub(crate) registration_seq: u64,
    #[serde(skip)]
    pub(crate) last_seen: Instant,
}

impl RemoteWorker {
    pub(crate) fn new(id: Uuid, name: String, tools: Vec<ToolDescriptor>, seq: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            status: WorkerStatus::Online,
            advertised_tools: tools,
            registered_at: now,
            last_heartbeat: now,
            registration_seq: seq,
            last_seen: Instant::now(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == WorkerStatus::Online
    }

    pub fn advertises(&self, tool_name: &str) -> bool {
        self.advertised_tools.iter().any(|t| t.name == tool_name)
    }

    pub(crate) fn touch(&mut self) {
        self.last_heartbeat = Utc::now();
        self.last_seen = Instant::now();
    }
}

/// A remote tool together with the worker currently serving it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteToolInfo {
    #[serde(flatten)]
    pub tool: ToolDescriptor,
    pub worker_id: Uuid,
    pub worker_name: String,
}
