//! Post-parse normalization
//!
//! Turns whatever object a strategy recovered into an [`AnalysisResult`]:
//! positions are 1-based or absent, text fields are strings, and a missing
//! quality score or summary is synthesized from the issue list.

use crate::model::{AnalysisResult, Issue, Metrics, Severity};
use crate::strategies::Document;
use serde_json::{Map, Value};

/// Base score before the issue-count penalty
pub const BASE_QUALITY: f64 = 90.0;

/// Cap on the issue-count penalty
pub const MAX_COUNT_PENALTY: f64 = 60.0;

/// Penalty per issue in the count-based score
pub const PENALTY_PER_ISSUE: f64 = 2.0;

const MAX_DERIVED_TITLE_CHARS: usize = 80;
const UNTITLED: &str = "Untitled issue";
const DEFAULT_ISSUE_TYPE: &str = "general";

/// Normalize a recovered document
#[must_use]
pub fn normalize(doc: &Document) -> AnalysisResult {
    let issues: Vec<Issue> = match doc.get("issues") {
        Some(Value::Array(items)) => items.iter().filter_map(normalize_issue).collect(),
        _ => Vec::new(),
    };

    let metrics_obj = doc.get("metrics").and_then(Value::as_object);
    let metric = |key: &str| -> Option<f64> {
        metrics_obj
            .and_then(|m| m.get(key))
            .and_then(score)
            .map(clamp_score)
    };
    let complexity = metric("complexity");
    let maintainability = metric("maintainability");
    let security = metric("security");
    let performance = metric("performance");
    let present: Vec<f64> = [complexity, maintainability, security, performance]
        .into_iter()
        .flatten()
        .collect();

    let quality_score = field(doc, &["quality_score", "qualityScore"])
        .and_then(score)
        .map_or_else(|| synthesize_quality(&issues, &present), clamp_score);

    let summary = field(doc, &["summary"])
        .and_then(text)
        .unwrap_or_else(|| synthesize_summary(&issues));

    AnalysisResult {
        metrics: Metrics {
            complexity: complexity.unwrap_or(quality_score),
            maintainability: maintainability.unwrap_or(quality_score),
            security: security.unwrap_or(quality_score),
            performance: performance.unwrap_or(quality_score),
        },
        issues,
        quality_score,
        summary,
    }
}

/// Normalize one entry of the `issues` list
///
/// Non-objects and empty objects are dropped.
#[must_use]
pub fn normalize_issue(value: &Value) -> Option<Issue> {
    let obj = value.as_object().filter(|o| !o.is_empty())?;

    let description = field(obj, &["description"]).and_then(text);
    let title = field(obj, &["title"])
        .and_then(text)
        .or_else(|| description.as_deref().map(derive_title))
        .unwrap_or_else(|| UNTITLED.to_string());

    Some(Issue {
        issue_type: field(obj, &["type", "issue_type", "category"])
            .and_then(text)
            .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string()),
        severity: field(obj, &["severity"])
            .and_then(text)
            .map(|s| Severity::from_label(&s))
            .unwrap_or_default(),
        title,
        description,
        suggestion: field(obj, &["suggestion"]).and_then(text),
        line: field(obj, &["line"]).and_then(position),
        column: field(obj, &["column"]).and_then(position),
        code_snippet: field(obj, &["code_snippet", "codeSnippet"]).and_then(text),
        explanation: field(obj, &["explanation"]).and_then(text),
    })
}

/// A 1-based position, or `None` for anything non-positive or non-numeric
#[must_use]
pub fn position(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !(n.is_finite() && n.fract() == 0.0 && n >= 1.0 && n <= f64::from(u32::MAX)) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pos = n as u32;
    Some(pos)
}

/// Stringify a text field; null and blank strings are absent
#[must_use]
pub fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok()?,
    };
    (!s.is_empty()).then_some(s)
}

/// Quality score when the document does not carry one
///
/// Without metrics: `90 - min(60, 2 * issues)`. With metrics: the mean of the
/// severity-weighted score and the mean metric. Clamped to `[0, 100]`.
#[must_use]
pub fn synthesize_quality(issues: &[Issue], metric_scores: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let count = issues.len() as f64;

    if metric_scores.is_empty() {
        return clamp_score(BASE_QUALITY - (PENALTY_PER_ISSUE * count).min(MAX_COUNT_PENALTY));
    }

    let weighted: f64 = issues.iter().map(|i| i.severity.penalty()).sum();
    let severity_score = clamp_score(100.0 - weighted);
    #[allow(clippy::cast_precision_loss)]
    let metrics_score = metric_scores.iter().sum::<f64>() / metric_scores.len() as f64;

    clamp_score((severity_score + metrics_score) / 2.0)
}

/// Summary line when the document does not carry one
#[must_use]
pub fn synthesize_summary(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return "No issues found.".to_string();
    }
    let count = |s: Severity| issues.iter().filter(|i| i.severity == s).count();
    format!(
        "Found {} issue{} ({} critical, {} high, {} medium, {} low).",
        issues.len(),
        if issues.len() == 1 { "" } else { "s" },
        count(Severity::Critical),
        count(Severity::High),
        count(Severity::Medium),
        count(Severity::Low),
    )
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn score(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

fn derive_title(description: &str) -> String {
    description.chars().take(MAX_DERIVED_TITLE_CHARS).collect()
}
