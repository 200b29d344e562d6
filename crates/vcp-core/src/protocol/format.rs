//! Echo tool results back into the conversation

use crate::tools::ToolCallResult;
use once_cell::sync::Lazy;
use regex::Regex;

const RESULT_TAG: &str = "TOOL_RESULT";
const ERROR_TAG: &str = "TOOL_ERROR";

static ECHO_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<<<\[(TOOL_RESULT|TOOL_ERROR)\]>>>\n\[([^\n]*)\]\n(.*?)\n<<<\[/(TOOL_RESULT|TOOL_ERROR)\]>>>")
        .expect("valid echo block regex")
});

/// A result block read back from text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoedResult {
    pub tool_name: String,
    pub text: String,
    pub success: bool,
}

/// Wrap a tool result for the next model turn
///
/// ```
/// use vcp_core::protocol::format;
///
/// let block = format("get_time", "12:00", true);
/// assert_eq!(block, "<<<[TOOL_RESULT]>>>\n[get_time]\n12:00\n<<<[/TOOL_RESULT]>>>");
/// ```
pub fn format(tool_name: &str, result_text: &str, success: bool) -> String {
    let tag = if success { RESULT_TAG } else { ERROR_TAG };
    format!("<<<[{tag}]>>>\n[{tool_name}]\n{result_text}\n<<<[/{tag}]>>>")
}

/// Wrap a [`ToolCallResult`]
pub fn format_result(tool_name: &str, result: &ToolCallResult) -> String {
    format(tool_name, &result.render_text(), result.is_success())
}

/// Read result and error blocks back out of text
pub fn parse_results(text: &str) -> Vec<EchoedResult> {
    ECHO_BLOCK
        .captures_iter(text)
        .filter(|caps| caps[1] == caps[4])
        .map(|caps| EchoedResult {
            tool_name: caps[2].to_string(),
            text: caps[3].to_string(),
            success: &caps[1] == RESULT_TAG,
        })
        .collect()
}
