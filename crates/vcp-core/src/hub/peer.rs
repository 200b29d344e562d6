//! Per-peer connection state

use super::message::{MessageType, PeerKind};
use super::transport::PeerTransport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tokio::time::Instant;
use uuid::Uuid;

/// A connected peer, owned by the hub
#[derive(Debug)]
pub(crate) struct Peer {
    pub id: Uuid,
    pub kind: PeerKind,
    pub is_authenticated: bool,
    pub connected_at: DateTime<Utc>,
    /// Monotonic time of the last inbound frame (including pongs)
    pub last_active_at: Instant,
    /// Empty means "everything"
    pub subscriptions: HashSet<MessageType>,
    pub display_name: Option<String>,
    pub protocol_version: Option<String>,
    pub transport: PeerTransport,
}

impl Peer {
    pub fn new(transport: PeerTransport, authenticated: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: PeerKind::Unknown,
            is_authenticated: authenticated,
            connected_at: Utc::now(),
            last_active_at: Instant::now(),
            subscriptions: HashSet::new(),
            display_name: None,
            protocol_version: None,
            transport,
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Instant::now();
    }

    /// Whether a broadcast of `message_type` should reach this peer
    pub fn wants(&self, message_type: &MessageType) -> bool {
        self.subscriptions.is_empty() || self.subscriptions.contains(message_type)
    }

    pub fn snapshot(&self) -> PeerSnapshot {
        let mut subscriptions: Vec<String> =
            self.subscriptions.iter().map(|t| t.to_string()).collect();
        subscriptions.sort();
        PeerSnapshot {
            id: self.id,
            kind: self.kind,
            is_authenticated: self.is_authenticated,
            connected_at: self.connected_at,
            idle_ms: self.last_active_at.elapsed().as_millis() as u64,
            subscriptions,
            display_name: self.display_name.clone(),
            protocol_version: self.protocol_version.clone(),
        }
    }
}

/// Read-only view of a peer handed to extensions and HTTP handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSnapshot {
    pub id: Uuid,
    pub kind: PeerKind,
    pub is_authenticated: bool,
    pub connected_at: DateTime<Utc>,
    pub idle_ms: u64,
    pub subscriptions: Vec<String>,
    pub display_name: Option<String>,
    pub protocol_version: Option<String>,
}
