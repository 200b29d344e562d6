//! Hub error types

use crate::error::VcpError;
use thiserror::Error;
use uuid::Uuid;

/// Errors from hub operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("peer {0} is not connected")]
    PeerNotFound(Uuid),

    /// The transport dropped its receiver; the peer has been removed
    #[error("transport for peer {0} is closed")]
    TransportClosed(Uuid),

    #[error("the hub has shut down")]
    HubClosed,
}

impl From<HubError> for VcpError {
    fn from(error: HubError) -> Self {
        match &error {
            HubError::PeerNotFound(id) | HubError::TransportClosed(id) => {
                VcpError::transport(error.to_string(), id)
            }
            HubError::HubClosed => VcpError::transport(error.to_string(), "hub"),
        }
    }
}
