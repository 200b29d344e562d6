//! Error types for the VCP hub
//!
//! Every subsystem has its own narrow error enum (`ProtocolParseError`,
//! `HubError`, `ExtensionError`, `ToolError`, `RouterError`, `ModelError`).
//! They all convert into [`VcpError`], which carries a stable `error_code()`
//! for programmatic handling at the HTTP boundary.

mod constructors;
mod types;
mod unified_error;

pub use types::{UnifiedError, VcpError, VcpResult};
