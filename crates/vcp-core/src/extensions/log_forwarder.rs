//! Relays `log` messages from any peer to log consumers

use super::{Extension, ExtensionError, ExtensionResult};
use crate::hub::{HubApi, Message, MessageType};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct LogForwarder {
    api: OnceCell<HubApi>,
    forwarded: AtomicU64,
}

impl LogForwarder {
    pub const ID: &'static str = "log_forwarder";

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of log messages relayed so far
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Extension for LogForwarder {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Log forwarder"
    }

    async fn initialize(&self, api: HubApi) -> ExtensionResult<()> {
        self.api
            .set(api)
            .map_err(|_| ExtensionError::Internal("already initialized".to_string()))
    }

    async fn on_message(&self, message: &Message) -> ExtensionResult<()> {
        if message.message_type != MessageType::Log {
            return Ok(());
        }
        let Some(api) = self.api.get() else {
            return Ok(());
        };

        let delivered = api
            .push_log(json!({
                "sourcePeerId": message.source_peer_id,
                "timestamp": message.timestamp.to_rfc3339(),
                "entry": message.data,
            }))
            .await;
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(delivered, "log entry relayed");
        Ok(())
    }
}
