//! Transport-facing side of a peer connection
//!
//! The hub never touches sockets. A transport driver owns the socket, feeds
//! inbound traffic into the hub and forwards every [`OutboundFrame`] it
//! receives on the peer's channel.

use tokio::sync::mpsc;

/// WebSocket close codes used by the hub
pub mod close_codes {
    /// Normal closure
    pub const NORMAL: u16 = 1000;
    /// Server going away
    pub const GOING_AWAY: u16 = 1001;
    /// No valid credential within the auth window
    pub const AUTH_TIMEOUT: u16 = 4001;
    /// Credential rejected
    pub const AUTH_FAILED: u16 = 4003;
    /// No traffic within the heartbeat timeout
    pub const HEARTBEAT_TIMEOUT: u16 = 4008;
}

/// A frame the transport should write to the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Ping,
    Close { code: u16, reason: String },
}

impl OutboundFrame {
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Self::Close {
            code,
            reason: reason.into(),
        }
    }
}

/// Outbound half of a peer connection, handed to the hub on attach
#[derive(Debug, Clone)]
pub struct PeerTransport {
    sender: mpsc::UnboundedSender<OutboundFrame>,
}

impl PeerTransport {
    pub fn new(sender: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self { sender }
    }

    /// Create a transport and the receiver its driver reads from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    /// Queue a frame; fails once the driver has gone away
    pub(crate) fn send(&self, frame: OutboundFrame) -> bool {
        self.sender.send(frame).is_ok()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
