//! Core types for scan orchestration
//!
//! - Job identifiers and status
//! - File tasks handed over by the lister
//! - The scan job view and its partial updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ulid::Ulid;

/// Unique job identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Generate new job ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// One file to scan
///
/// Produced by a [`FileLister`](crate::ports::FileLister), consumed once per
/// scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileTask {
    /// Repository-relative path
    pub path: String,
    /// Where the fetcher reads the content from
    pub remote_locator: String,
}

impl FileTask {
    /// Create new file task
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, remote_locator: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            remote_locator: remote_locator.into(),
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not started
    Pending,
    /// Workers are running
    Running,
    /// Every file was attempted
    Completed,
    /// Circuit breaker tripped or setup failed
    Failed,
    /// Cancelled by the user
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses never change again
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Scan job as seen by readers of the task store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    /// Job ID
    pub id: JobId,
    /// Lifecycle status
    pub status: JobStatus,
    /// Files in the scan
    pub total_files: usize,
    /// Files whose results were committed
    pub scanned_files: usize,
    /// Files skipped after a fetch, analyzer or parse failure
    pub failed_files: usize,
    /// Lines across committed files
    pub total_lines: usize,
    /// Issues across committed files
    pub issues_count: usize,
    /// Final quality score, set on completion
    pub quality_score: Option<f64>,
    /// Why the job failed
    pub error_message: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// When workers started
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanJob {
    /// New pending job
    #[must_use]
    pub fn pending(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            total_files: 0,
            scanned_files: 0,
            failed_files: 0,
            total_lines: 0,
            issues_count: 0,
            quality_score: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Apply a partial update (last write wins per field)
    pub fn apply(&mut self, update: &JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(v) = update.total_files {
            self.total_files = v;
        }
        if let Some(v) = update.scanned_files {
            self.scanned_files = v;
        }
        if let Some(v) = update.failed_files {
            self.failed_files = v;
        }
        if let Some(v) = update.total_lines {
            self.total_lines = v;
        }
        if let Some(v) = update.issues_count {
            self.issues_count = v;
        }
        if let Some(v) = update.quality_score {
            self.quality_score = Some(v);
        }
        if let Some(v) = &update.error_message {
            self.error_message = Some(v.clone());
        }
        if let Some(v) = update.started_at {
            self.started_at = Some(v);
        }
        if let Some(v) = update.finished_at {
            self.finished_at = Some(v);
        }
    }
}

/// Partial job update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    /// New status
    pub status: Option<JobStatus>,
    /// Files in the scan
    pub total_files: Option<usize>,
    /// Committed files
    pub scanned_files: Option<usize>,
    /// Skipped files
    pub failed_files: Option<usize>,
    /// Lines across committed files
    pub total_lines: Option<usize>,
    /// Issues across committed files
    pub issues_count: Option<usize>,
    /// Final quality score
    pub quality_score: Option<f64>,
    /// Failure reason
    pub error_message: Option<String>,
    /// Start time
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal transition time
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    /// Empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress counters of a job
    #[must_use]
    pub fn progress(job: &ScanJob) -> Self {
        Self {
            scanned_files: Some(job.scanned_files),
            failed_files: Some(job.failed_files),
            total_lines: Some(job.total_lines),
            issues_count: Some(job.issues_count),
            ..Self::default()
        }
    }

    /// Everything a terminal transition persists
    #[must_use]
    pub fn terminal(job: &ScanJob) -> Self {
        Self {
            status: Some(job.status),
            quality_score: job.quality_score,
            error_message: job.error_message.clone(),
            finished_at: job.finished_at,
            ..Self::progress(job)
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// With total files
    #[inline]
    #[must_use]
    pub fn total_files(mut self, total: usize) -> Self {
        self.total_files = Some(total);
        self
    }

    /// With start time
    #[inline]
    #[must_use]
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }
}

/// Final quality score of a completed scan
///
/// `100` without issues, otherwise `max(0, 100 - 2 * issues)`.
#[must_use]
pub fn final_quality_score(issues_count: usize) -> f64 {
    if issues_count == 0 {
        return 100.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let penalty = issues_count.saturating_mul(2) as f64;
    (100.0 - penalty).max(0.0)
}
