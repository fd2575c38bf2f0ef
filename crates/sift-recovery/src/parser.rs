//! The recovery parser
//!
//! Runs an ordered chain of [`RecoveryStrategy`] objects over a raw response
//! and normalizes the first document recovered.

use crate::error::{ParseFailure, StrategyError};
use crate::model::AnalysisResult;
use crate::normalize::normalize;
use crate::strategies::{builtin_strategies, Document, RecoveryStrategy};
use crate::truncation::looks_truncated;

const DIAGNOSTIC_SNIPPET_CHARS: usize = 100;

/// A recovered and normalized response
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// Normalized result
    pub result: AnalysisResult,
    /// Name of the strategy that succeeded
    pub strategy: &'static str,
}

/// Priority-ordered chain of recovery strategies
pub struct RecoveryParser {
    strategies: Vec<Box<dyn RecoveryStrategy>>,
}

impl Default for RecoveryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecoveryParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryParser")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

impl RecoveryParser {
    /// Parser with the built-in strategies
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: builtin_strategies(),
        }
    }

    /// Parser with no strategies
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy after the existing ones
    #[inline]
    #[must_use]
    pub fn with_strategy<S: RecoveryStrategy + 'static>(mut self, strategy: S) -> Self {
        self.register(strategy);
        self
    }

    /// Append a strategy after the existing ones
    pub fn register<S: RecoveryStrategy + 'static>(&mut self, strategy: S) {
        self.strategies.push(Box::new(strategy));
    }

    /// Strategy names in priority order
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Parse a raw response into a normalized result
    ///
    /// # Errors
    /// [`ParseFailure`] with diagnostics when every strategy fails.
    pub fn parse(&self, raw: &str) -> Result<AnalysisResult, ParseFailure> {
        self.recover(raw).map(|r| r.result)
    }

    /// Parse and report which strategy succeeded
    ///
    /// # Errors
    /// [`ParseFailure`] with diagnostics when every strategy fails.
    pub fn recover(&self, raw: &str) -> Result<Recovered, ParseFailure> {
        let (document, strategy) = self.recover_document(raw)?;
        Ok(Recovered {
            result: normalize(&document),
            strategy,
        })
    }

    /// Recover the raw document without normalizing it
    ///
    /// # Errors
    /// [`ParseFailure`] with diagnostics when every strategy fails.
    pub fn recover_document(&self, raw: &str) -> Result<(Document, &'static str), ParseFailure> {
        let mut tried = Vec::with_capacity(self.strategies.len());
        let mut last_error: Option<StrategyError> = None;

        for strategy in &self.strategies {
            tried.push(strategy.name());
            match strategy.attempt(raw) {
                Ok(doc) => {
                    if tried.len() > 1 {
                        tracing::debug!(strategy = strategy.name(), attempts = tried.len(), "recovered response");
                    }
                    return Ok((doc, strategy.name()));
                }
                Err(err) => {
                    tracing::trace!(strategy = strategy.name(), error = %err, "recovery strategy failed");
                    last_error = Some(err);
                }
            }
        }

        let failure = diagnose(raw, tried, last_error);
        tracing::debug!(
            raw_len = failure.raw_len,
            likely_truncated = failure.likely_truncated,
            "all recovery strategies failed"
        );
        Err(failure)
    }
}

/// Build failure diagnostics for raw text
#[must_use]
pub fn diagnose(
    raw: &str,
    strategies_tried: Vec<&'static str>,
    last_error: Option<StrategyError>,
) -> ParseFailure {
    let chars: Vec<char> = raw.chars().collect();
    let head: String = chars.iter().take(DIAGNOSTIC_SNIPPET_CHARS).collect();
    let tail: String = chars[chars.len().saturating_sub(DIAGNOSTIC_SNIPPET_CHARS)..]
        .iter()
        .collect();
    let trimmed = raw.trim();

    ParseFailure {
        raw_len: chars.len(),
        head,
        tail,
        first_char: trimmed.chars().next(),
        last_char: trimmed.chars().next_back(),
        open_braces: raw.matches('{').count(),
        close_braces: raw.matches('}').count(),
        likely_truncated: looks_truncated(raw),
        strategies_tried,
        last_error: last_error.map_or_else(|| "no strategies registered".to_string(), |e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Counting(Arc<AtomicUsize>);

    impl RecoveryStrategy for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn attempt(&self, _raw: &str) -> Result<Document, StrategyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(StrategyError::NoObject)
        }
    }

    #[test]
    fn well_formed_input_uses_direct_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let parser = RecoveryParser::empty()
            .with_strategy(crate::strategies::Direct)
            .with_strategy(Counting(Arc::clone(&calls)));

        let recovered = parser.recover(r#"{"issues": [], "quality_score": 95}"#).unwrap();
        assert_eq!(recovered.strategy, "direct");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn custom_strategy_runs_after_builtins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let parser = RecoveryParser::new().with_strategy(Counting(Arc::clone(&calls)));

        assert_eq!(parser.strategy_names().last(), Some(&"counting"));
        assert!(parser.parse("no json at all").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_parser_fails_with_diagnostics() {
        let failure = RecoveryParser::empty().parse("{}").unwrap_err();
        assert!(failure.strategies_tried.is_empty());
        assert_eq!(failure.last_error, "no strategies registered");
    }

    #[test]
    fn diagnostics_capture_shape() {
        let failure = RecoveryParser::new().parse("  I could not analyze this file.  ").unwrap_err();
        assert_eq!(failure.first_char, Some('I'));
        assert_eq!(failure.last_char, Some('.'));
        assert_eq!(failure.open_braces, 0);
        assert!(!failure.likely_truncated);
        assert_eq!(failure.strategies_tried.len(), 5);
    }

    #[test]
    fn debug_lists_strategies() {
        let debug = format!("{:?}", RecoveryParser::new());
        assert!(debug.contains("truncation_repair"));
    }
}
