//! The message hub

use super::api::HubApi;
use super::error::HubError;
use super::message::{
    InboundEnvelope, Message, MessageType, PeerKind, error_codes, error_frame, pong_frame,
};
use super::peer::{Peer, PeerSnapshot};
use super::transport::{OutboundFrame, PeerTransport, close_codes};
use crate::config::{AuthConfig, HubConfig};
use crate::extensions::{Extension, ExtensionHost, ExtensionInfo, ExtensionResult};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shared hub state
pub(crate) struct HubInner {
    pub(crate) auth: AuthConfig,
    pub(crate) config: HubConfig,
    pub(crate) peers: DashMap<Uuid, Peer>,
    pub(crate) extensions: ExtensionHost,
    pub(crate) shutdown: CancellationToken,
}

/// Real-time message hub
///
/// Owns every peer connection: authentication, liveness, subscriptions and
/// routing between peers and extensions. Cheap to clone.
#[derive(Clone)]
pub struct MessageHub {
    pub(crate) inner: Arc<HubInner>,
}

impl MessageHub {
    pub fn new(auth: AuthConfig, config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                auth,
                config,
                peers: DashMap::new(),
                extensions: ExtensionHost::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Start the heartbeat loop
    pub fn start(&self) -> JoinHandle<()> {
        super::heartbeat::spawn(Arc::downgrade(&self.inner))
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Handle extensions use to talk back to the hub
    pub fn api(&self) -> HubApi {
        HubApi::new(Arc::downgrade(&self.inner))
    }

    /// Token cancelled when the hub shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Accept a new connection and return its peer id
    ///
    /// When authentication is required the peer starts unauthenticated and
    /// has `auth_timeout` to present a valid key.
    pub fn attach(&self, transport: PeerTransport) -> Uuid {
        let authenticated = !self.inner.auth.required;
        let peer = Peer::new(transport, authenticated);
        let peer_id = peer.id;
        self.inner.peers.insert(peer_id, peer);
        tracing::info!(peer = %peer_id, authenticated, "peer connected");

        if !authenticated {
            super::auth::spawn_auth_timer(Arc::downgrade(&self.inner), peer_id);
        }
        peer_id
    }

    /// Process one inbound text frame from a peer
    pub async fn handle_text(&self, peer_id: Uuid, text: &str) {
        self.inner.handle_text(peer_id, text).await;
    }

    /// Record a transport-level pong
    pub fn handle_pong(&self, peer_id: Uuid) {
        if let Some(mut peer) = self.inner.peers.get_mut(&peer_id) {
            peer.touch();
        }
    }

    /// The transport closed; drop the peer
    pub async fn detach(&self, peer_id: Uuid) {
        self.inner.remove_peer(peer_id, "transport closed").await;
    }

    /// Deliver a message to every eligible peer, returning the delivered count
    ///
    /// Eligible peers are authenticated, subscribed to the message type (an
    /// empty subscription set means everything) and of a kind listed in
    /// `message.target_kinds` when that is set.
    pub async fn broadcast(&self, message: &Message) -> usize {
        self.inner.broadcast(message).await
    }

    /// Deliver to every eligible peer of one kind
    pub async fn send_to_kind(&self, kind: PeerKind, message: &Message) -> usize {
        self.inner.send_to_kind(kind, message).await
    }

    /// Deliver to one peer regardless of its subscriptions
    pub async fn send_to_peer(&self, peer_id: Uuid, message: &Message) -> Result<(), HubError> {
        self.inner.send_to_peer(peer_id, message).await
    }

    pub async fn register_extension(&self, extension: Arc<dyn Extension>) -> ExtensionResult<()> {
        self.inner.extensions.register(extension, self.api()).await
    }

    pub async fn unregister_extension(&self, id: &str) -> ExtensionResult<()> {
        self.inner.extensions.unregister(id).await
    }

    pub fn list_peers(&self) -> Vec<PeerSnapshot> {
        self.inner.list_peers()
    }

    pub fn list_extensions(&self) -> Vec<ExtensionInfo> {
        self.inner.extensions.list()
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Evict silent peers and ping the rest; returns the number evicted
    pub async fn check_liveness(&self) -> usize {
        self.inner.check_liveness().await
    }

    /// Close every peer, stop background tasks and clean up extensions
    pub async fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        self.inner.shutdown.cancel();

        let peer_ids: Vec<Uuid> = self.inner.peers.iter().map(|r| *r.key()).collect();
        for peer_id in peer_ids {
            if let Some((_, peer)) = self.inner.peers.remove(&peer_id) {
                peer.transport
                    .send(OutboundFrame::close(close_codes::GOING_AWAY, "Server shutting down"));
            }
        }

        self.inner.extensions.shutdown_all().await;
        tracing::info!("message hub shut down");
    }
}

impl HubInner {
    pub(crate) async fn handle_text(&self, peer_id: Uuid, text: &str) {
        let envelope = match InboundEnvelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(peer = %peer_id, error = %e, "invalid inbound frame");
                self.send_raw(peer_id, error_frame(error_codes::INVALID_MESSAGE, "Invalid message format"));
                return;
            }
        };

        let authenticated = match self.peers.get_mut(&peer_id) {
            Some(mut peer) => {
                peer.touch();
                peer.is_authenticated
            }
            None => return,
        };

        if !authenticated && !envelope.message_type.allowed_before_auth() {
            self.send_raw(
                peer_id,
                error_frame(error_codes::NOT_AUTHENTICATED, "Authenticate before sending messages"),
            );
            return;
        }

        match &envelope.message_type {
            MessageType::Auth => self.handle_auth(peer_id, &envelope).await,
            MessageType::Ping => {
                self.send_raw(peer_id, pong_frame());
            }
            MessageType::Pong => {}
            MessageType::Subscribe => self.update_subscriptions(peer_id, &envelope, true),
            MessageType::Unsubscribe => self.update_subscriptions(peer_id, &envelope, false),
            _ => {
                let message = Message::new(envelope.message_type.clone(), envelope.payload()).from_peer(peer_id);
                self.extensions.dispatch(&message).await;
            }
        }
    }

    fn update_subscriptions(&self, peer_id: Uuid, envelope: &InboundEnvelope, subscribe: bool) {
        let types = message_types_field(envelope.field("types").or_else(|| envelope.field("subscriptions")));
        if let Some(mut peer) = self.peers.get_mut(&peer_id) {
            for message_type in types {
                if subscribe {
                    peer.subscriptions.insert(message_type);
                } else {
                    peer.subscriptions.remove(&message_type);
                }
            }
            tracing::debug!(peer = %peer_id, subscriptions = peer.subscriptions.len(), "subscriptions updated");
        }
    }

    pub(crate) async fn broadcast(&self, message: &Message) -> usize {
        let frame = message.to_frame();
        let mut delivered = 0;
        let mut failed = Vec::new();

        for peer in self.peers.iter() {
            if peer.transport.is_closed() {
                failed.push(peer.id);
                continue;
            }
            if !peer.is_authenticated || !peer.wants(&message.message_type) || !message.targets(peer.kind) {
                continue;
            }
            if peer.transport.send(OutboundFrame::Text(frame.clone())) {
                delivered += 1;
            } else {
                failed.push(peer.id);
            }
        }

        for peer_id in failed {
            self.remove_peer(peer_id, "send failed").await;
        }
        delivered
    }

    pub(crate) async fn send_to_kind(&self, kind: PeerKind, message: &Message) -> usize {
        let mut targeted = message.clone();
        let kinds: HashSet<PeerKind> = match &message.target_kinds {
            Some(kinds) if !kinds.contains(&kind) => return 0,
            _ => HashSet::from([kind]),
        };
        targeted.target_kinds = Some(kinds);
        self.broadcast(&targeted).await
    }

    pub(crate) async fn send_to_peer(&self, peer_id: Uuid, message: &Message) -> Result<(), HubError> {
        if self.shutdown.is_cancelled() {
            return Err(HubError::HubClosed);
        }
        let sent = match self.peers.get(&peer_id) {
            Some(peer) => peer.transport.send(OutboundFrame::Text(message.to_frame())),
            None => return Err(HubError::PeerNotFound(peer_id)),
        };
        if sent {
            Ok(())
        } else {
            self.remove_peer(peer_id, "send failed").await;
            Err(HubError::TransportClosed(peer_id))
        }
    }

    pub(crate) fn list_peers(&self) -> Vec<PeerSnapshot> {
        let mut peers: Vec<PeerSnapshot> = self.peers.iter().map(|r| r.snapshot()).collect();
        peers.sort_by_key(|p| p.connected_at);
        peers
    }

    /// Send a control frame; a dead transport removes the peer on the next broadcast
    pub(crate) fn send_raw(&self, peer_id: Uuid, frame: String) -> bool {
        self.peers
            .get(&peer_id)
            .is_some_and(|peer| peer.transport.send(OutboundFrame::Text(frame)))
    }

    /// Close a peer's transport with a code and remove it
    pub(crate) async fn close_peer(&self, peer_id: Uuid, code: u16, reason: &str) {
        if let Some(peer) = self.peers.get(&peer_id) {
            peer.transport.send(OutboundFrame::close(code, reason));
        }
        self.remove_peer(peer_id, reason).await;
    }

    /// Remove a peer and tell extensions about it
    pub(crate) async fn remove_peer(&self, peer_id: Uuid, reason: &str) {
        let Some((_, peer)) = self.peers.remove(&peer_id) else {
            return;
        };
        tracing::info!(peer = %peer_id, kind = ?peer.kind, reason, "peer disconnected");

        let notice = Message::new(
            MessageType::PeerDisconnected,
            json!({
                "peerId": peer_id,
                "kind": peer.kind,
                "reason": reason,
            }),
        )
        .from_peer(peer_id);
        self.extensions.dispatch(&notice).await;
    }
}

/// Read a list of message types from a JSON array of strings
pub(crate) fn message_types_field(value: Option<&Value>) -> Vec<MessageType> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(MessageType::from)
                .collect()
        })
        .unwrap_or_default()
}
