//! Error types for Sift Core
//!
//! Provides error handling for:
//! - Job store and issue sink failures
//! - Per-file failures (fetch, analyzer, unparseable response)
//! - Illegal job status transitions
//! - Configuration loading

use crate::types::{JobId, JobStatus};
use sift_recovery::ParseFailure;

/// Main scan error type
///
/// Per-file problems never surface here; they are recorded as
/// [`FileFailure`]s and fed to the circuit breaker.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Task store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Attempted a status change the lifecycle does not allow
    #[error("illegal job transition: {from} -> {to}")]
    IllegalTransition {
        /// Current status
        from: JobStatus,
        /// Requested status
        to: JobStatus,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Orchestration task panicked or was aborted
    #[error("scan task failed: {0}")]
    Task(String),
}

impl ScanError {
    /// Check if error came from the task store
    #[inline]
    #[must_use]
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Check if error is a lifecycle violation
    #[inline]
    #[must_use]
    pub fn is_illegal_transition(&self) -> bool {
        matches!(self, Self::IllegalTransition { .. })
    }

    /// Check if error is an invalid configuration
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Task store / issue sink errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No job with this ID
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// Backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Analyzer call failed; the message is opaque
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("analyzer error: {0}")]
pub struct AnalyzerError(pub String);

impl AnalyzerError {
    /// Create new analyzer error
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Content could not be fetched or listed
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Nothing at the locator
    #[error("not found: {0}")]
    NotFound(String),

    /// IO failure
    #[error("io error at {path}: {source}")]
    Io {
        /// Locator or directory being read
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Other backend failure
    #[error("{0}")]
    Other(String),
}

/// Why a single file was skipped
#[derive(Debug, thiserror::Error)]
pub enum FileFailure {
    /// Content could not be fetched
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Analyzer call failed
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    /// Analyzer answered but nothing parseable could be recovered
    #[error(transparent)]
    Unparseable(#[from] ParseFailure),
}

impl FileFailure {
    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Analyzer(_) => "analyzer",
            Self::Unparseable(_) => "unparseable",
        }
    }

    /// Check if the analyzer response looked cut off
    #[inline]
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Unparseable(f) if f.likely_truncated)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read {path}: {source}")]
    Io {
        /// Config path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_failure_kinds() {
        let fetch = FileFailure::from(FetchError::NotFound("a.rs".into()));
        let analyzer = FileFailure::from(AnalyzerError::new("rate limited"));

        assert_eq!(fetch.kind(), "fetch");
        assert_eq!(analyzer.kind(), "analyzer");
        assert_eq!(analyzer.to_string(), "analyzer error: rate limited");
        assert!(!analyzer.is_truncation());
    }

    #[test]
    fn illegal_transition_message() {
        let err = ScanError::IllegalTransition {
            from: JobStatus::Completed,
            to: JobStatus::Running,
        };
        assert!(err.is_illegal_transition());
        assert_eq!(err.to_string(), "illegal job transition: completed -> running");
    }
}
