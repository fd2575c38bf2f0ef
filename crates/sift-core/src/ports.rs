//! Collaborator traits
//!
//! The orchestrator only talks to the outside world through these. Errors
//! crossing the boundary carry opaque messages.

use crate::error::{AnalyzerError, FetchError, StoreError};
use crate::types::{FileTask, JobId, JobUpdate, ScanJob};
use async_trait::async_trait;
use sift_recovery::Issue;

/// Text-generation analyzer
///
/// Returns the raw response; the orchestrator runs it through the recovery
/// parser.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze one file
    async fn analyze(&self, content: &str, language_hint: &str) -> Result<String, AnalyzerError>;

    /// Analyze one file, knowing which file it is
    ///
    /// The orchestrator calls this. Analyzers that only look at content keep
    /// the default.
    async fn analyze_file(
        &self,
        _file: &FileTask,
        content: &str,
        language_hint: &str,
    ) -> Result<String, AnalyzerError> {
        self.analyze(content, language_hint).await
    }
}

/// Reads file content
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch content of one file
    async fn fetch(&self, file: &FileTask) -> Result<String, FetchError>;
}

/// Enumerates files to scan
///
/// Filtering (extensions, size, ignore rules) happens here, not in the
/// orchestrator.
#[async_trait]
pub trait FileLister: Send + Sync {
    /// List files
    async fn list(&self) -> Result<Vec<FileTask>, FetchError>;
}

/// Durable job records
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a pending job
    async fn create_job(&self) -> Result<JobId, StoreError>;

    /// Apply a partial update
    async fn update_job(&self, id: JobId, update: JobUpdate) -> Result<(), StoreError>;

    /// Read a job
    async fn get_job(&self, id: JobId) -> Result<ScanJob, StoreError>;
}

/// Receives issues as files are committed
#[async_trait]
pub trait IssueSink: Send + Sync {
    /// Store one issue
    async fn create_issue(&self, job_id: JobId, file: &FileTask, issue: &Issue) -> Result<(), StoreError>;
}
