//! Tool-call text protocol
//!
//! Models embed tool calls in their output as delimited blocks:
//!
//! ```text
//! <<<[TOOL_REQUEST]>>>
//! tool_name:「始」search「末」
//! query:「始」rust async「末」
//! <<<[END_TOOL_REQUEST]>>>
//! ```
//!
//! This module finds those blocks, turns them into [`ToolCallRequest`]s,
//! strips them from display text and formats results for the next turn.
//! It is a pure text transform with no I/O.
//!
//! [`ToolCallRequest`]: crate::tools::ToolCallRequest

mod error;
mod format;
mod keys;
mod markers;
mod parser;
mod scanner;

#[cfg(test)]
mod tests;

pub use error::ProtocolParseError;
pub use format::{EchoedResult, format, format_result, parse_results};
pub use keys::{FIRE_AND_FORGET_KEY, NO_REPLY_SENTINEL, ReservedKey, TOOL_NAME_KEY, normalize_key};
pub use parser::{ParseReport, has_any_call, parse, parse_with_diagnostics, strip};
