//! Real-time message hub
//!
//! Peers connect through a transport driver (the WebSocket endpoint in the
//! server crate), authenticate with the shared key, and then exchange typed
//! JSON messages. The hub answers the built-in types itself (`auth`, `ping`,
//! `subscribe`, `unsubscribe`) and forwards everything else to extensions.

mod api;
mod auth;
mod error;
mod heartbeat;
mod message;
mod peer;
mod service;
mod transport;

#[cfg(test)]
mod tests;

pub use api::HubApi;
pub use error::HubError;
pub use message::{Message, MessageType, PeerKind, error_codes};
pub use peer::PeerSnapshot;
pub use service::MessageHub;
pub use transport::{OutboundFrame, PeerTransport, close_codes};
