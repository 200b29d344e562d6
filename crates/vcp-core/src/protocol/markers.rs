//! Block marker detection
//!
//! Markers are `<<<[TOOL_REQUEST]>>>` and `<<<[END_TOOL_REQUEST]>>>`. Each
//! angle-bracket run may be two or three characters long; runs of one or of
//! four and more do not count as markers.

use super::error::ProtocolParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static START_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<{2,3}\[TOOL_REQUEST\]>{2,3}").expect("valid start marker regex"));

static END_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<{2,3}\[END_TOOL_REQUEST\]>{2,3}").expect("valid end marker regex")
});

/// A matched start/end pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    /// From the first byte of the start marker to the last byte of the end marker
    pub span: Range<usize>,
    /// Text between the markers
    pub body: Range<usize>,
}

/// Find the next marker at or after `from` whose angle runs are not longer than three
fn find_marker(re: &Regex, text: &str, from: usize) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let mut cursor = from;
    while cursor <= text.len() {
        let m = re.find_at(text, cursor)?;
        let preceded = m.start() > 0 && bytes[m.start() - 1] == b'<';
        let followed = bytes.get(m.end()) == Some(&b'>');
        if !preceded && !followed {
            return Some(m.range());
        }
        cursor = m.end();
    }
    None
}

/// Locate every complete block, reporting unterminated starts
pub(crate) fn locate_blocks(text: &str, diagnostics: &mut Vec<ProtocolParseError>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(start) = find_marker(&START_MARKER, text, cursor) {
        let end = find_marker(&END_MARKER, text, start.end);
        let next_start = find_marker(&START_MARKER, text, start.end);

        match (end, next_start) {
            (Some(end), Some(next)) if next.start < end.start => {
                diagnostics.push(ProtocolParseError::UnterminatedBlock {
                    offset: start.start,
                });
                cursor = next.start;
            }
            (Some(end), _) => {
                cursor = end.end;
                blocks.push(Block {
                    span: start.start..end.end,
                    body: start.end..end.start,
                });
            }
            (None, _) => {
                diagnostics.push(ProtocolParseError::UnterminatedBlock {
                    offset: start.start,
                });
                // Any later start is just as unterminated; report each one.
                cursor = start.end;
            }
        }
    }

    blocks
}

/// Whether the text contains at least one complete block
pub(crate) fn contains_block(text: &str) -> bool {
    find_marker(&START_MARKER, text, 0)
        .and_then(|start| find_marker(&END_MARKER, text, start.end))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> (Vec<Block>, Vec<ProtocolParseError>) {
        let mut diagnostics = Vec::new();
        let blocks = locate_blocks(text, &mut diagnostics);
        (blocks, diagnostics)
    }

    #[test]
    fn test_two_and_three_angle_runs() {
        for text in [
            "<<<[TOOL_REQUEST]>>>x<<<[END_TOOL_REQUEST]>>>",
            "<<[TOOL_REQUEST]>>x<<[END_TOOL_REQUEST]>>",
            "<<[TOOL_REQUEST]>>>x<<<[END_TOOL_REQUEST]>>",
        ] {
            let (blocks, diagnostics) = spans(text);
            assert_eq!(blocks.len(), 1, "{text}");
            assert!(diagnostics.is_empty());
            assert_eq!(&text[blocks[0].body.clone()], "x");
            assert_eq!(blocks[0].span, 0..text.len());
        }
    }

    #[test]
    fn test_rejects_one_and_four_angle_runs() {
        for text in [
            "<[TOOL_REQUEST]>x<[END_TOOL_REQUEST]>",
            "<<<<[TOOL_REQUEST]>>>>x<<<<[END_TOOL_REQUEST]>>>>",
            "<<<[TOOL_REQUEST]>>>>x<<<[END_TOOL_REQUEST]>>>",
        ] {
            let (blocks, _) = spans(text);
            assert!(blocks.is_empty(), "{text}");
        }
    }

    #[test]
    fn test_unterminated_block_is_reported_and_next_block_kept() {
        let text = "<<<[TOOL_REQUEST]>>>a <<<[TOOL_REQUEST]>>>b<<<[END_TOOL_REQUEST]>>>";
        let (blocks, diagnostics) = spans(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(&text[blocks[0].body.clone()], "b");
        assert_eq!(
            diagnostics,
            vec![ProtocolParseError::UnterminatedBlock { offset: 0 }]
        );
    }

    #[test]
    fn test_trailing_start_without_end() {
        let (blocks, diagnostics) = spans("text <<<[TOOL_REQUEST]>>> tool:「始」x");
        assert!(blocks.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_contains_block() {
        assert!(contains_block("a <<[TOOL_REQUEST]>> b <<[END_TOOL_REQUEST]>>"));
        assert!(!contains_block("a <<[TOOL_REQUEST]>> b"));
        assert!(!contains_block("<<[END_TOOL_REQUEST]>> <<[TOOL_REQUEST]>>"));
    }
}
