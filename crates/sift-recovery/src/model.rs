//! Output contract of the recovery parser
//!
//! Defines the validated shapes produced from a raw model response:
//! - [`AnalysisResult`] - document-level result
//! - [`Issue`] - a single normalized finding
//! - [`Severity`] - lenient severity classification
//! - [`Metrics`] - per-dimension scores

use serde::{Deserialize, Serialize};

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before shipping
    Critical,
    /// Serious defect
    High,
    /// Worth fixing
    #[default]
    Medium,
    /// Minor or informational
    Low,
}

impl Severity {
    /// Parse a severity label leniently
    ///
    /// Unknown labels map to [`Severity::Medium`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" | "blocker" | "severe" => Self::Critical,
            "high" | "major" | "error" => Self::High,
            "low" | "minor" | "info" | "informational" | "trivial" | "note" => Self::Low,
            _ => Self::Medium,
        }
    }

    /// Quality penalty applied per issue of this severity
    #[inline]
    #[must_use]
    pub fn penalty(self) -> f64 {
        match self {
            Self::Critical => 30.0,
            Self::High => 20.0,
            Self::Medium => 10.0,
            Self::Low => 5.0,
        }
    }

    /// Lowercase label
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized finding
///
/// `line` and `column` are 1-based when present. Zero never appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue category (e.g. `bug`, `security`, `style`)
    #[serde(rename = "type")]
    pub issue_type: String,
    /// Severity
    pub severity: Severity,
    /// Short title
    pub title: String,
    /// Longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Suggested fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// 1-based line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// 1-based column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// Offending code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    /// Why this matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Issue {
    /// Create issue with required fields only
    #[inline]
    #[must_use]
    pub fn new(issue_type: impl Into<String>, severity: Severity, title: impl Into<String>) -> Self {
        Self {
            issue_type: issue_type.into(),
            severity,
            title: title.into(),
            description: None,
            suggestion: None,
            line: None,
            column: None,
            code_snippet: None,
            explanation: None,
        }
    }

    /// With position
    #[inline]
    #[must_use]
    pub fn at(mut self, line: Option<u32>, column: Option<u32>) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Per-dimension quality scores, each in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Structural complexity (higher is simpler)
    pub complexity: f64,
    /// Ease of change
    pub maintainability: f64,
    /// Security posture
    pub security: f64,
    /// Runtime efficiency
    pub performance: f64,
}

impl Metrics {
    /// All dimensions set to the same score
    #[inline]
    #[must_use]
    pub fn uniform(score: f64) -> Self {
        Self {
            complexity: score,
            maintainability: score,
            security: score,
            performance: score,
        }
    }
}

/// Validated analysis of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Normalized issues
    pub issues: Vec<Issue>,
    /// Document quality score in `[0, 100]`
    pub quality_score: f64,
    /// One-line summary
    pub summary: String,
    /// Per-dimension scores
    pub metrics: Metrics,
}

impl AnalysisResult {
    /// Number of issues at a given severity
    #[must_use]
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}
