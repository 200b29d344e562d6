use super::*;
use crate::tools::ToolCallResult;
use serde_json::json;

#[test]
fn test_end_to_end_example() {
    let text = "Sure! <<<[TOOL_REQUEST]>>>tool_name:「始」get_time「末」<<<[END_TOOL_REQUEST]>>> done";

    let requests = parse(text);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tool_name, "get_time");
    assert!(requests[0].parameters.is_empty());
    assert!(!requests[0].fire_and_forget);
    assert_eq!(requests[0].raw_span, "Sure! ".len()..text.len() - " done".len());

    assert!(has_any_call(text));
    assert_eq!(strip(text), "Sure!  done");
}

#[test]
fn test_full_block_with_aliases() {
    let text = r#"Let me look that up.
<<<[TOOL_REQUEST]>>>
ToolName:「始」web_search「末」
maxResults:「始」5「末」
search-query:「始」tokio
cancellation「末」
archery:「始」no_reply「末」
<<<[END_TOOL_REQUEST]>>>"#;

    let report = parse_with_diagnostics(text);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    let request = &report.requests[0];
    assert_eq!(request.tool_name, "web_search");
    assert!(request.fire_and_forget);
    assert_eq!(request.param("max_results"), Some("5"));
    assert_eq!(request.param("search_query"), Some("tokio\ncancellation"));
    assert!(request.param("tool_name").is_none());
    assert!(request.param("archery").is_none());
    assert_eq!(request.parameters.len(), 2);
}

#[test]
fn test_marker_tolerance() {
    for (start, end) in [
        ("<<<[TOOL_REQUEST]>>>", "<<<[END_TOOL_REQUEST]>>>"),
        ("<<[TOOL_REQUEST]>>", "<<[END_TOOL_REQUEST]>>"),
        ("<<[TOOL_REQUEST]>>>", "<<<[END_TOOL_REQUEST]>>"),
    ] {
        let text = format!("{start}tool:「始」echo「末」{end}");
        let requests = parse(&text);
        assert_eq!(requests.len(), 1, "{text}");
        assert_eq!(requests[0].tool_name, "echo");
    }

    for text in [
        "<[TOOL_REQUEST]>tool:「始」echo「末」<[END_TOOL_REQUEST]>",
        "<<<<[TOOL_REQUEST]>>>>tool:「始」echo「末」<<<<[END_TOOL_REQUEST]>>>>",
    ] {
        assert!(parse(text).is_empty(), "{text}");
        assert!(!has_any_call(text));
    }
}

#[test]
fn test_multi_block_isolation() {
    let text = "\
<<<[TOOL_REQUEST]>>>tool_name:「始」first「末」<<<[END_TOOL_REQUEST]>>>
<<<[TOOL_REQUEST]>>>query:「始」no name here「末」<<<[END_TOOL_REQUEST]>>>
<<<[TOOL_REQUEST]>>>tool_name:「始」third「末」 note:「始」unclosed
<<<[END_TOOL_REQUEST]>>>
<<<[TOOL_REQUEST]>>>pluginName:「始」fourth「末」<<<[END_TOOL_REQUEST]>>>";

    let report = parse_with_diagnostics(text);
    let names: Vec<&str> = report.requests.iter().map(|r| r.tool_name.as_str()).collect();
    assert_eq!(names, vec!["first", "third", "fourth"]);
    assert_eq!(report.requests[1].param("note"), Some("unclosed"));

    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, ProtocolParseError::MissingToolName { .. })));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, ProtocolParseError::UnclosedValue { key, .. } if key == "note")));

    let stripped = strip(text);
    assert!(stripped.contains("query:「始」no name here「末」"));
    assert!(!stripped.contains("first"));
    assert!(!stripped.contains("fourth"));
}

#[test]
fn test_strip_keeps_blocks_without_a_tool_name() {
    let good = "<<<[TOOL_REQUEST]>>>tool_name:「始」ok「末」<<<[END_TOOL_REQUEST]>>>";
    let bad = "<<<[TOOL_REQUEST]>>>query:「始」no name here「末」<<<[END_TOOL_REQUEST]>>>";
    let text = format!("A {good} B {bad} C");

    assert_eq!(parse(&text).len(), 1);
    assert_eq!(strip(&text), format!("A  B {bad} C"));
}

#[test]
fn test_blank_tool_name_is_discarded() {
    let report = parse_with_diagnostics("<<[TOOL_REQUEST]>>tool_name:「始」   「末」<<[END_TOOL_REQUEST]>>");
    assert!(report.requests.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
}

#[test]
fn test_fire_and_forget_requires_known_value() {
    let on = parse("<<[TOOL_REQUEST]>>tool:「始」a「末」fireAndForget:「始」true「末」<<[END_TOOL_REQUEST]>>");
    assert!(on[0].fire_and_forget);

    let off = parse("<<[TOOL_REQUEST]>>tool:「始」a「末」archery:「始」maybe「末」<<[END_TOOL_REQUEST]>>");
    assert!(!off[0].fire_and_forget);
    assert!(off[0].parameters.is_empty());
}

#[test]
fn test_raw_spans_are_ordered_and_stripped() {
    let text = "a<<[TOOL_REQUEST]>>tool:「始」x「末」<<[END_TOOL_REQUEST]>>b<<[TOOL_REQUEST]>>tool:「始」y「末」<<[END_TOOL_REQUEST]>>c";
    let requests = parse(text);
    assert!(requests[0].raw_span.end <= requests[1].raw_span.start);
    assert_eq!(strip(text), "abc");
}

#[test]
fn test_strip_leaves_plain_text_alone() {
    let text = "nothing to see <<[TOOL_REQUEST]>> here";
    assert_eq!(strip(text), text);
}

#[test]
fn test_format_round_trip() {
    let cases = [
        ("get_time", "2024-01-01T00:00:00Z", true),
        ("search", "line one\nline two", true),
        ("broken", "tool exploded", false),
        ("empty", "", true),
    ];

    for (name, body, success) in cases {
        let echoed = parse_results(&format(name, body, success));
        assert_eq!(
            echoed,
            vec![EchoedResult {
                tool_name: name.to_string(),
                text: body.to_string(),
                success,
            }]
        );
    }
}

#[test]
fn test_format_error_markers() {
    let block = format("x", "bad", false);
    assert!(block.starts_with("<<<[TOOL_ERROR]>>>\n[x]\n"));
    assert!(block.ends_with("\n<<<[/TOOL_ERROR]>>>"));
}

#[test]
fn test_format_result_uses_payload_or_error() {
    let ok = ToolCallResult::success(json!("sunny"));
    assert_eq!(
        format_result("weather", &ok),
        "<<<[TOOL_RESULT]>>>\n[weather]\nsunny\n<<<[/TOOL_RESULT]>>>"
    );

    let failed = ToolCallResult::failure("no such city");
    let echoed = parse_results(&format_result("weather", &failed));
    assert_eq!(echoed[0].text, "no such city");
    assert!(!echoed[0].success);
}

#[test]
fn test_parse_results_ignores_mismatched_tags() {
    let text = "<<<[TOOL_RESULT]>>>\n[x]\nbody\n<<<[/TOOL_ERROR]>>>";
    assert!(parse_results(text).is_empty());
}
