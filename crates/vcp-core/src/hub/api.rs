//! Handle given to extensions

use super::service::HubInner;
use super::error::HubError;
use super::message::{Message, MessageType, PeerKind};
use super::peer::PeerSnapshot;
use serde_json::{Value, json};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Restricted view of the hub for extensions
///
/// Holds a weak reference, so an extension can never keep the hub alive.
/// Once the hub is gone every send reports zero deliveries or
/// [`HubError::HubClosed`].
#[derive(Clone)]
pub struct HubApi {
    hub: Weak<HubInner>,
}

impl HubApi {
    pub(crate) fn new(hub: Weak<HubInner>) -> Self {
        Self { hub }
    }

    fn upgrade(&self) -> Option<Arc<HubInner>> {
        self.hub.upgrade().filter(|inner| !inner.shutdown.is_cancelled())
    }

    /// Whether the hub is still running
    pub fn is_alive(&self) -> bool {
        self.upgrade().is_some()
    }

    pub async fn broadcast(&self, message: &Message) -> usize {
        match self.upgrade() {
            Some(inner) => inner.broadcast(message).await,
            None => 0,
        }
    }

    pub async fn send_to_kind(&self, kind: PeerKind, message: &Message) -> usize {
        match self.upgrade() {
            Some(inner) => inner.send_to_kind(kind, message).await,
            None => 0,
        }
    }

    pub async fn send_to_peer(&self, peer_id: Uuid, message: &Message) -> Result<(), HubError> {
        match self.upgrade() {
            Some(inner) => inner.send_to_peer(peer_id, message).await,
            None => Err(HubError::HubClosed),
        }
    }

    /// Send a `log` message to internal peers (log consumers)
    pub async fn push_log(&self, data: Value) -> usize {
        let message = Message::new(MessageType::Log, data);
        self.send_to_kind(PeerKind::Internal, &message).await
    }

    /// Broadcast a `progress` update for a request
    pub async fn push_progress(&self, request_id: &str, data: Value) -> usize {
        let message = Message::new(
            MessageType::Progress,
            json!({ "requestId": request_id, "progress": data }),
        );
        self.broadcast(&message).await
    }

    /// Broadcast a `status` message
    pub async fn push_status(&self, data: Value) -> usize {
        self.broadcast(&Message::new(MessageType::Status, data)).await
    }

    /// Snapshot of the connected peers
    pub fn peers(&self) -> Vec<PeerSnapshot> {
        self.upgrade()
            .map(|inner| inner.list_peers())
            .unwrap_or_default()
    }
}
