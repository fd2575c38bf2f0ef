//! Error types for response recovery
//!
//! - [`StrategyError`] - why a single recovery strategy gave up
//! - [`ParseFailure`] - every strategy gave up; carries operator diagnostics

use std::fmt;

/// Failure of one recovery strategy
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// No `{` anywhere in the input
    #[error("no object start found")]
    NoObject,

    /// Object opened but depth never returned to zero
    #[error("object is not closed")]
    Unbalanced,

    /// No fenced code block in the input
    #[error("no fenced code block found")]
    NoFence,

    /// Object is already closed; nothing to repair
    #[error("object is closed; nothing to repair")]
    NotTruncated,

    /// Repair could not produce a parseable prefix
    #[error("repair exhausted after {0} cut-backs")]
    RepairExhausted(usize),

    /// Parsed, but the top-level value is not an object
    #[error("expected an object, found {0}")]
    NotAnObject(&'static str),

    /// JSON syntax error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// All recovery strategies failed
///
/// Holds enough about the raw text to tell a truncated response from a
/// malformed one without re-running the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Length of the raw text in characters
    pub raw_len: usize,
    /// First characters of the raw text
    pub head: String,
    /// Last characters of the raw text
    pub tail: String,
    /// First non-whitespace character
    pub first_char: Option<char>,
    /// Last non-whitespace character
    pub last_char: Option<char>,
    /// Number of `{`
    pub open_braces: usize,
    /// Number of `}`
    pub close_braces: usize,
    /// Truncation detector verdict
    pub likely_truncated: bool,
    /// Strategies attempted, in order
    pub strategies_tried: Vec<&'static str>,
    /// Error from the last strategy
    pub last_error: String,
}

impl ParseFailure {
    /// Brace imbalance (`{` minus `}`)
    #[inline]
    #[must_use]
    pub fn brace_imbalance(&self) -> i64 {
        self.open_braces as i64 - self.close_braces as i64
    }

    /// Operator guidance for this failure
    #[must_use]
    pub fn hint(&self) -> &'static str {
        if self.likely_truncated {
            "response looks truncated; raise the analyzer output token limit"
        } else {
            "response is complete but malformed; check the analyzer prompt and output format"
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unparseable response ({} chars, braces {}/{}, truncated: {}): {}; last error: {}",
            self.raw_len,
            self.open_braces,
            self.close_braces,
            self.likely_truncated,
            self.hint(),
            self.last_error,
        )
    }
}

impl std::error::Error for ParseFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(likely_truncated: bool) -> ParseFailure {
        ParseFailure {
            raw_len: 12,
            head: "{\"issues\":[".to_string(),
            tail: "{\"issues\":[".to_string(),
            first_char: Some('{'),
            last_char: Some('['),
            open_braces: 1,
            close_braces: 0,
            likely_truncated,
            strategies_tried: vec!["direct"],
            last_error: "EOF".to_string(),
        }
    }

    #[test]
    fn display_mentions_truncation_hint() {
        let msg = failure(true).to_string();
        assert!(msg.contains("truncated"));
        assert!(msg.contains("token limit"));
    }

    #[test]
    fn display_mentions_malformed_hint() {
        let msg = failure(false).to_string();
        assert!(msg.contains("malformed"));
    }

    #[test]
    fn brace_imbalance_is_signed() {
        assert_eq!(failure(true).brace_imbalance(), 1);
    }

    #[test]
    fn strategy_error_from_json() {
        let err: StrategyError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("json error"));
    }
}
