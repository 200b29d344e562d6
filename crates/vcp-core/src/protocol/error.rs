//! Diagnostics produced while parsing tool-call blocks

use crate::error::VcpError;
use thiserror::Error;

/// A recoverable problem found while parsing
///
/// None of these abort the parse; the affected block or parameter is skipped
/// (or salvaged) and parsing continues with its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolParseError {
    /// A start marker with no end marker before the next start marker
    #[error("unterminated tool request block at byte {offset}")]
    UnterminatedBlock { offset: usize },

    /// A complete block without a usable tool name
    #[error("tool request block at byte {offset} has no tool name")]
    MissingToolName { offset: usize },

    /// A value opened with 「始」 that never saw 「末」
    #[error("value for '{key}' in block at byte {offset} was not closed, salvaged partial value")]
    UnclosedValue { key: String, offset: usize },

    /// A value delimiter without a `key:` in front of it
    #[error("parameter without a key in block at byte {offset}: {fragment}")]
    MalformedParameter { fragment: String, offset: usize },
}

impl From<ProtocolParseError> for VcpError {
    fn from(error: ProtocolParseError) -> Self {
        VcpError::protocol(error.to_string())
    }
}
