use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use sift_recovery::{looks_truncated, RecoveryParser, Severity};

const WELL_FORMED: &str = r#"{
  "issues": [
    {"type": "bug", "severity": "high", "title": "Unchecked index", "line": 12, "column": 5,
     "description": "Index may exceed the slice length.", "suggestion": "Use get()"},
    {"type": "style", "severity": "low", "title": "Long function", "line": 40}
  ],
  "quality_score": 72,
  "summary": "Two findings.",
  "metrics": {"complexity": 70, "maintainability": 65, "security": 80, "performance": 75}
}"#;

#[test]
fn well_formed_document_parses_directly() {
    let recovered = RecoveryParser::new().recover(WELL_FORMED).unwrap();

    assert_eq!(recovered.strategy, "direct");
    assert_eq!(recovered.result.issues.len(), 2);
    assert_eq!(recovered.result.quality_score, 72.0);
    assert_eq!(recovered.result.summary, "Two findings.");
    assert_eq!(recovered.result.metrics.maintainability, 65.0);
    assert_eq!(recovered.result.issues[0].line, Some(12));
    assert_eq!(recovered.result.issues[0].column, Some(5));
}

#[test]
fn literal_newlines_and_trailing_comma_recover_equivalently() {
    let parser = RecoveryParser::new();
    let valid = json!({
        "issues": [{
            "type": "bug",
            "severity": "critical",
            "title": "SQL injection",
            "description": "User input flows\ninto the query\nunescaped.",
            "code_snippet": "let q = format!(\"SELECT {}\", input);\nconn.execute(&q);",
            "line": 3
        }],
        "summary": "One finding\nacross two lines."
    })
    .to_string();

    let mut corrupted = valid.replace("\\n", "\n");
    let last_brace = corrupted.rfind('}').unwrap();
    corrupted.insert(last_brace, ',');

    let expected = parser.parse(&valid).unwrap();
    let recovered = parser.recover(&corrupted).unwrap();

    assert_ne!(recovered.strategy, "direct");
    assert_eq!(recovered.result, expected);
}

#[test]
fn truncated_mid_array_is_detected_and_repaired() {
    let raw = r#"{"issues":[{"title":"a""#;
    assert!(looks_truncated(raw));

    let recovered = RecoveryParser::new().recover(raw).unwrap();
    assert_eq!(recovered.strategy, "truncation_repair");
    assert!(recovered.result.issues.len() <= 1);
    assert_eq!(recovered.result.issues[0].title, "a");
}

#[test]
fn zero_negative_and_text_positions_are_absent() {
    let raw = r#"{"issues": [
        {"title": "zero", "line": 0, "column": 0},
        {"title": "negative", "line": -1, "column": -1},
        {"title": "text", "line": "abc", "column": "abc"}
    ]}"#;

    let result = RecoveryParser::new().parse(raw).unwrap();
    assert_eq!(result.issues.len(), 3);
    for issue in &result.issues {
        assert_eq!(issue.line, None, "{}", issue.title);
        assert_eq!(issue.column, None, "{}", issue.title);
    }
}

#[test]
fn prose_wrapped_fenced_response() {
    let raw = "Sure {here} is the review.\n\n```json\n{\n  \"issues\": [\n    {\"title\": \"Leak\", \"severity\": \"high\"}\n    {\"title\": \"Race\", \"severity\": \"critical\"}\n  ]\n}\n```\nLet me know!";
    let recovered = RecoveryParser::new().recover(raw).unwrap();

    assert_eq!(recovered.strategy, "fenced");
    let result = recovered.result;
    assert_eq!(result.issues.len(), 2);
    assert_eq!(result.count_severity(Severity::Critical), 1);
    // 90 - 2 * 2
    assert_eq!(result.quality_score, 86.0);
    assert_eq!(result.summary, "Found 2 issues (1 critical, 1 high, 0 medium, 0 low).");
}

#[test]
fn smart_quotes_inside_values_are_dropped() {
    // Smart quotes are legal JSON, so the raw newline is what forces sanitizing.
    let raw = "{\"issues\": [{\"title\": \"Avoid \u{201C}magic\u{201D} numbers\", \"description\": \"a\nb\"}]}";
    let recovered = RecoveryParser::new().recover(raw).unwrap();
    assert_eq!(recovered.strategy, "sanitize");
    assert_eq!(recovered.result.issues[0].title, "Avoid magic numbers");
}

#[test]
fn refusal_text_fails_with_malformed_verdict() {
    let failure = RecoveryParser::new()
        .parse("I'm sorry, I cannot review this file.")
        .unwrap_err();

    assert!(!failure.likely_truncated);
    assert_eq!(failure.open_braces, 0);
    assert!(failure.to_string().contains("malformed"));
}

#[test]
fn truncated_fence_without_object_fails_with_truncated_verdict() {
    let failure = RecoveryParser::new().parse("```json\n").unwrap_err();
    assert!(failure.likely_truncated);
    assert!(failure.to_string().contains("token limit"));
}

/// The key/value heuristic only looks at nearby punctuation. A value string
/// that follows a string inside an array of arrays is still classified
/// correctly, but a bare value directly after `{` is treated as a key and its
/// control characters are left alone.
#[test]
fn key_value_heuristic_is_best_effort() {
    let nested = "{\"rows\": [[\"a\nb\"]]}";
    let result = RecoveryParser::new().recover_document(nested).unwrap();
    assert_eq!(result.0["rows"][0][0], "a\nb");

    // `{"x\ny"}` is not valid even once sanitized: the string sits in key position.
    assert!(RecoveryParser::new().parse("{\"x\ny\"}").is_err());
}

fn prefix_fixture() -> String {
    json!({
        "issues": [
            {"type": "bug", "severity": "high", "title": "First", "line": 1, "description": "a \"quoted\" word"},
            {"type": "perf", "severity": "medium", "title": "Second", "line": 22, "column": 4},
            {"type": "style", "severity": "low", "title": "Third", "suggestion": "rename"}
        ],
        "quality_score": 81.5,
        "metrics": {"complexity": 60, "security": 90},
        "summary": "Three findings."
    })
    .to_string()
}

proptest! {
    #[test]
    fn parser_never_panics(raw in any::<String>()) {
        let _ = RecoveryParser::new().parse(&raw);
    }

    #[test]
    fn parser_never_panics_on_json_like_noise(raw in r#"[\{\}\[\]",: a-z0-9\\\n`]{0,80}"#) {
        let _ = RecoveryParser::new().parse(&raw);
    }

    #[test]
    fn every_prefix_of_a_document_recovers(cut in 1usize..400) {
        let full = prefix_fixture();
        let cut = cut.min(full.len());
        let prefix = &full[..cut];

        let result = RecoveryParser::new().parse(prefix);
        prop_assert!(result.is_ok(), "prefix failed: {prefix}");
        prop_assert!(result.unwrap().issues.len() <= 3);
    }

    #[test]
    fn positions_are_never_zero(line in any::<i64>(), column in -5.0f64..5.0) {
        let raw = json!({"issues": [{"title": "t", "line": line, "column": column}]}).to_string();
        let result = RecoveryParser::new().parse(&raw).unwrap();
        let issue = &result.issues[0];
        prop_assert!(issue.line.map_or(true, |l| l >= 1));
        prop_assert!(issue.column.map_or(true, |c| c >= 1));
        prop_assert_eq!(issue.line.is_some(), (1..=i64::from(u32::MAX)).contains(&line));
    }
}
