//! Peer authentication

use super::service::{HubInner, message_types_field};
use super::message::{InboundEnvelope, PeerKind, auth_response_frame, error_codes, error_frame};
use super::transport::close_codes;
use std::sync::Weak;
use uuid::Uuid;

impl HubInner {
    /// Handle an `auth` frame
    ///
    /// On success the peer adopts the declared kind, name, protocol version and
    /// subscriptions. A rejected key closes the connection with 4003.
    pub(crate) async fn handle_auth(&self, peer_id: Uuid, envelope: &InboundEnvelope) {
        let presented = envelope.str_field("apiKey");

        if !self.auth.verify(presented) {
            tracing::warn!(peer = %peer_id, "peer presented an invalid API key");
            self.send_raw(peer_id, auth_response_frame(Err("Invalid API key")));
            self.close_peer(peer_id, close_codes::AUTH_FAILED, "Authentication failed")
                .await;
            return;
        }

        let kind = envelope
            .str_field("clientType")
            .map(PeerKind::from_client_type)
            .unwrap_or_default();
        let subscriptions = message_types_field(envelope.field("subscriptions"));

        let updated = match self.peers.get_mut(&peer_id) {
            Some(mut peer) => {
                peer.is_authenticated = true;
                peer.kind = kind;
                peer.display_name = envelope.str_field("clientName").map(str::to_string);
                peer.protocol_version = envelope.str_field("protocolVersion").map(str::to_string);
                peer.subscriptions = subscriptions.into_iter().collect();
                true
            }
            None => false,
        };

        if updated {
            tracing::info!(peer = %peer_id, kind = ?kind, "peer authenticated");
            self.send_raw(peer_id, auth_response_frame(Ok(peer_id)));
        }
    }
}

/// Close the peer if it is still unauthenticated when the auth window ends
pub(crate) fn spawn_auth_timer(hub: Weak<HubInner>, peer_id: Uuid) {
    let Some(inner) = hub.upgrade() else {
        return;
    };
    let window = inner.config.auth_timeout;
    let shutdown = inner.shutdown.clone();
    drop(inner);

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(window) => {}
            _ = shutdown.cancelled() => return,
        }

        let Some(inner) = hub.upgrade() else {
            return;
        };
        let pending = inner
            .peers
            .get(&peer_id)
            .is_some_and(|peer| !peer.is_authenticated);
        if pending {
            tracing::warn!(peer = %peer_id, "peer did not authenticate in time");
            inner.send_raw(
                peer_id,
                error_frame(error_codes::AUTH_TIMEOUT, "Authentication timed out"),
            );
            inner
                .close_peer(peer_id, close_codes::AUTH_TIMEOUT, "Authentication timeout")
                .await;
        }
    });
}
