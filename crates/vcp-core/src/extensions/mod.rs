//! Hub extensions
//!
//! Provides:
//! - The [`Extension`] trait that hub add-ons implement
//! - [`ExtensionHost`], which tracks registered extensions and their lifecycle
//! - [`LogForwarder`], a built-in extension relaying peer logs to log consumers

mod host;
mod lifecycle;
mod log_forwarder;

pub use host::{ExtensionHost, ExtensionInfo};
pub use lifecycle::{ExtensionLifecycle, ExtensionState, StateChange};
pub use log_forwarder::LogForwarder;

use crate::error::VcpError;
use crate::hub::{HubApi, Message};
use async_trait::async_trait;

/// Extension result type
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Extension error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtensionError {
    #[error("Extension not found: {0}")]
    NotFound(String),

    #[error("Extension already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Extension '{id}' initialization failed: {reason}")]
    InitFailed { id: String, reason: String },

    #[error("Extension '{id}' failed to handle message: {reason}")]
    HandlerFailed { id: String, reason: String },

    #[error("Extension '{id}' panicked: {message}")]
    Panicked { id: String, message: String },

    #[error("Invalid extension state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ExtensionState,
        to: ExtensionState,
    },

    #[error("Extension internal error: {0}")]
    Internal(String),
}

impl From<ExtensionError> for VcpError {
    fn from(error: ExtensionError) -> Self {
        VcpError::extension(error.to_string())
    }
}

/// A hub add-on
///
/// Methods take `&self`; implementations keep their own state behind interior
/// mutability. Errors and panics from any method are caught by the host and
/// never reach other extensions or peers.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Unique id used for registration and lookup
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Called once after registration with the handle to the hub
    async fn initialize(&self, api: HubApi) -> ExtensionResult<()>;

    /// Called for every authenticated inbound message that is not handled by the hub itself
    async fn on_message(&self, message: &Message) -> ExtensionResult<()>;

    /// Called on unregister and on hub shutdown
    async fn cleanup(&self) -> ExtensionResult<()> {
        Ok(())
    }
}
