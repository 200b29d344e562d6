//! Parameter scanner for the body of a tool request block
//!
//! Parameters look like `key:「始」value「末」`. A value either closes on the
//! same line or runs over several lines until a line containing `「末」`.

use super::error::ProtocolParseError;

pub(crate) const VALUE_OPEN: &str = "「始」";
pub(crate) const VALUE_CLOSE: &str = "「末」";

/// A raw `(key, value)` pair before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawParam {
    pub key: String,
    pub value: String,
}

#[derive(Debug)]
enum ScanState {
    /// Looking for the next `key:「始」`
    Idle,
    /// Inside a multi-line value
    InValue { key: Option<String>, buffer: String },
}

/// Scan a block body into raw parameters
///
/// `offset` is the byte offset of the block in the full text, used only for
/// diagnostics.
pub(crate) fn scan_params(
    body: &str,
    offset: usize,
    diagnostics: &mut Vec<ProtocolParseError>,
) -> Vec<RawParam> {
    let mut params = Vec::new();
    let mut state = ScanState::Idle;

    for line in body.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        let rest = match std::mem::replace(&mut state, ScanState::Idle) {
            ScanState::Idle => Some(line),
            ScanState::InValue { key, mut buffer } => match line.find(VALUE_CLOSE) {
                Some(close) => {
                    buffer.push_str(&line[..close]);
                    push_param(&mut params, key, buffer);
                    Some(&line[close + VALUE_CLOSE.len()..])
                }
                None => {
                    buffer.push_str(line);
                    buffer.push('\n');
                    state = ScanState::InValue { key, buffer };
                    None
                }
            },
        };

        if let Some(rest) = rest {
            state = scan_line(rest, offset, &mut params, diagnostics);
        }
    }

    if let ScanState::InValue { key, buffer } = state {
        if let Some(key) = &key {
            diagnostics.push(ProtocolParseError::UnclosedValue {
                key: key.clone(),
                offset,
            });
        }
        push_param(&mut params, key, buffer);
    }

    params
}

/// Scan one line (or the tail of a line) in the idle state
///
/// Consumes every single-line parameter on it and returns the state to carry
/// into the next line.
fn scan_line(
    mut line: &str,
    offset: usize,
    params: &mut Vec<RawParam>,
    diagnostics: &mut Vec<ProtocolParseError>,
) -> ScanState {
    while let Some(open) = line.find(VALUE_OPEN) {
        let key = extract_key(&line[..open]);
        if key.is_none() {
            diagnostics.push(ProtocolParseError::MalformedParameter {
                fragment: line[..open].trim().to_string(),
                offset,
            });
        }

        let after_open = &line[open + VALUE_OPEN.len()..];
        match after_open.find(VALUE_CLOSE) {
            Some(close) => {
                push_param(params, key, after_open[..close].to_string());
                line = &after_open[close + VALUE_CLOSE.len()..];
            }
            None => {
                let mut buffer = after_open.to_string();
                buffer.push('\n');
                return ScanState::InValue { key, buffer };
            }
        }
    }
    ScanState::Idle
}

/// Pull the key out of the text in front of `「始」`
///
/// The text must end with `:` or `：`; separators left over from a previous
/// parameter on the same line (`,` `;`) are ignored.
fn extract_key(prefix: &str) -> Option<String> {
    let prefix = prefix.trim_end();
    let prefix = prefix
        .strip_suffix(':')
        .or_else(|| prefix.strip_suffix('：'))?;
    let key = prefix
        .trim()
        .trim_start_matches(|c: char| c == ',' || c == ';' || c == '，' || c.is_whitespace());
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

fn push_param(params: &mut Vec<RawParam>, key: Option<String>, value: String) {
    if let Some(key) = key {
        params.push(RawParam {
            key,
            value: value.trim().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(body: &str) -> (Vec<RawParam>, Vec<ProtocolParseError>) {
        let mut diagnostics = Vec::new();
        let params = scan_params(body, 0, &mut diagnostics);
        (params, diagnostics)
    }

    fn pair(key: &str, value: &str) -> RawParam {
        RawParam {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_single_line_values() {
        let (params, diagnostics) = scan("\ntool_name:「始」search「末」\nquery：「始」rust async「末」\n");
        assert!(diagnostics.is_empty());
        assert_eq!(params, vec![pair("tool_name", "search"), pair("query", "rust async")]);
    }

    #[test]
    fn test_several_params_on_one_line() {
        let (params, _) = scan("a:「始」1「末」, b:「始」2「末」; c : 「始」3「末」");
        assert_eq!(params, vec![pair("a", "1"), pair("b", "2"), pair("c", "3")]);
    }

    #[test]
    fn test_multi_line_value_keeps_inner_newlines() {
        let body = "tool_name:「始」write「末」\ncontent:「始」\nline one\n\nline three\n「末」\nmode:「始」append「末」";
        let (params, diagnostics) = scan(body);
        assert!(diagnostics.is_empty());
        assert_eq!(
            params,
            vec![
                pair("tool_name", "write"),
                pair("content", "line one\n\nline three"),
                pair("mode", "append"),
            ]
        );
    }

    #[test]
    fn test_value_closing_mid_line_continues_scanning() {
        let (params, _) = scan("text:「始」first\nsecond「末」 next:「始」v「末」");
        assert_eq!(params, vec![pair("text", "first\nsecond"), pair("next", "v")]);
    }

    #[test]
    fn test_unclosed_value_is_salvaged() {
        let (params, diagnostics) = scan("tool_name:「始」t「末」\nbody:「始」partial\ntext");
        assert_eq!(params, vec![pair("tool_name", "t"), pair("body", "partial\ntext")]);
        assert_eq!(
            diagnostics,
            vec![ProtocolParseError::UnclosedValue {
                key: "body".to_string(),
                offset: 0
            }]
        );
    }

    #[test]
    fn test_value_without_key_is_skipped() {
        let (params, diagnostics) = scan("「始」orphan「末」 ok:「始」1「末」");
        assert_eq!(params, vec![pair("ok", "1")]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_free_text_is_ignored() {
        let (params, diagnostics) = scan("just some prose\nwith no params");
        assert!(params.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let (params, _) = scan("a:「始」\r\nx\r\ny\r\n「末」\r\n");
        assert_eq!(params, vec![pair("a", "x\ny")]);
    }
}
