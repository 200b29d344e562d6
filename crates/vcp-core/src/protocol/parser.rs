//! Extract tool call requests from model output

use super::error::ProtocolParseError;
use super::keys::{ReservedKey, is_fire_and_forget_value, normalize_key};
use super::markers::{contains_block, locate_blocks};
use super::scanner::scan_params;
use crate::tools::ToolCallRequest;
use std::collections::HashMap;

/// Parsed requests together with everything that was skipped or salvaged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub requests: Vec<ToolCallRequest>,
    pub diagnostics: Vec<ProtocolParseError>,
}

/// Parse every tool request block in `text`
///
/// Diagnostics are logged at warn level and otherwise dropped.
pub fn parse(text: &str) -> Vec<ToolCallRequest> {
    let report = parse_with_diagnostics(text);
    for diagnostic in &report.diagnostics {
        tracing::warn!(error = %diagnostic, "tool request block diagnostic");
    }
    report.requests
}

/// Parse every tool request block and return the diagnostics to the caller
pub fn parse_with_diagnostics(text: &str) -> ParseReport {
    let mut diagnostics = Vec::new();
    let blocks = locate_blocks(text, &mut diagnostics);
    let mut requests = Vec::with_capacity(blocks.len());

    for block in blocks {
        let offset = block.span.start;
        let raw = scan_params(&text[block.body.clone()], offset, &mut diagnostics);

        let mut tool_name = None;
        let mut fire_and_forget = false;
        let mut parameters = HashMap::new();

        for param in raw {
            let key = normalize_key(&param.key);
            match ReservedKey::classify(&key) {
                Some(ReservedKey::ToolName) => tool_name = Some(param.value),
                Some(ReservedKey::FireAndForget) => {
                    fire_and_forget = is_fire_and_forget_value(&param.value)
                }
                None if key.is_empty() => {
                    diagnostics.push(ProtocolParseError::MalformedParameter {
                        fragment: param.key,
                        offset,
                    });
                }
                None => {
                    parameters.insert(key, param.value);
                }
            }
        }

        match tool_name.filter(|name| !name.is_empty()) {
            Some(tool_name) => requests.push(ToolCallRequest {
                tool_name,
                parameters,
                fire_and_forget,
                raw_span: block.span,
            }),
            None => diagnostics.push(ProtocolParseError::MissingToolName { offset }),
        }
    }

    ParseReport {
        requests,
        diagnostics,
    }
}

/// Cheap check for at least one complete block
pub fn has_any_call(text: &str) -> bool {
    contains_block(text)
}

/// Remove the span of every parsed request from `text`
///
/// Blocks that fail to parse stay in place. Text around the removed blocks is
/// kept byte for byte, including whitespace.
pub fn strip(text: &str) -> String {
    let mut spans: Vec<_> = parse_with_diagnostics(text)
        .requests
        .into_iter()
        .map(|request| request.raw_span)
        .collect();
    spans.sort_by(|a, b| b.start.cmp(&a.start));

    let mut stripped = text.to_string();
    for span in spans {
        stripped.replace_range(span, "");
    }
    stripped
}
