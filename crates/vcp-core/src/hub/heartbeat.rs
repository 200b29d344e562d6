//! Peer liveness

use super::service::HubInner;
use super::transport::{OutboundFrame, close_codes};
use std::sync::Weak;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

impl HubInner {
    /// Evict peers silent for longer than `heartbeat_timeout` and ping the rest
    pub(crate) async fn check_liveness(&self) -> usize {
        let timeout = self.config.heartbeat_timeout;
        let now = Instant::now();
        let mut stale: Vec<Uuid> = Vec::new();
        let mut dead: Vec<Uuid> = Vec::new();

        for peer in self.peers.iter() {
            if now.saturating_duration_since(peer.last_active_at) > timeout {
                stale.push(peer.id);
            } else if !peer.transport.send(OutboundFrame::Ping) {
                dead.push(peer.id);
            }
        }

        for peer_id in &stale {
            tracing::warn!(peer = %peer_id, "heartbeat timeout");
            self.close_peer(*peer_id, close_codes::HEARTBEAT_TIMEOUT, "Heartbeat timeout")
                .await;
        }
        for peer_id in dead {
            self.remove_peer(peer_id, "send failed").await;
        }

        stale.len()
    }
}

/// Run the heartbeat until the hub shuts down or is dropped
pub(crate) fn spawn(hub: Weak<HubInner>) -> JoinHandle<()> {
    let (period, shutdown) = match hub.upgrade() {
        Some(inner) => (inner.config.heartbeat_interval, inner.shutdown.clone()),
        None => return tokio::spawn(async {}),
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => break,
            }

            let Some(inner) = hub.upgrade() else {
                break;
            };
            let evicted = inner.check_liveness().await;
            if evicted > 0 {
                tracing::info!(evicted, remaining = inner.peers.len(), "heartbeat sweep");
            }
        }
        tracing::debug!("heartbeat loop stopped");
    })
}
