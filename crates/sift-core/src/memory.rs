//! In-memory task store and issue sink
//!
//! Suitable for the CLI and tests. The store keeps every update it receives
//! so tests can assert on the order of writes.

use crate::error::StoreError;
use crate::ports::{IssueSink, TaskStore};
use crate::types::{FileTask, JobId, JobUpdate, ScanJob};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use sift_recovery::Issue;

/// Job records in a concurrent map
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    jobs: DashMap<JobId, ScanJob>,
    history: Mutex<Vec<(JobId, JobUpdate)>>,
}

impl InMemoryTaskStore {
    /// Create empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job record directly
    pub fn insert(&self, job: ScanJob) {
        self.jobs.insert(job.id, job);
    }

    /// Snapshot of a job, if present
    #[must_use]
    pub fn snapshot(&self, id: JobId) -> Option<ScanJob> {
        self.jobs.get(&id).map(|job| job.clone())
    }

    /// Updates applied to a job, oldest first
    #[must_use]
    pub fn updates(&self, id: JobId) -> Vec<JobUpdate> {
        self.history
            .lock()
            .iter()
            .filter(|(job, _)| *job == id)
            .map(|(_, update)| update.clone())
            .collect()
    }

    /// Number of jobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create_job(&self) -> Result<JobId, StoreError> {
        let id = JobId::new();
        self.jobs.insert(id, ScanJob::pending(id));
        Ok(id)
    }

    async fn update_job(&self, id: JobId, update: JobUpdate) -> Result<(), StoreError> {
        let mut job = self.jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        job.apply(&update);
        self.history.lock().push((id, update));
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<ScanJob, StoreError> {
        self.snapshot(id).ok_or(StoreError::NotFound(id))
    }
}

/// Issue recorded by [`InMemoryIssueSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedIssue {
    /// Owning job
    pub job_id: JobId,
    /// File the issue was found in
    pub path: String,
    /// The issue
    pub issue: Issue,
}

/// Issues in arrival order
#[derive(Debug, Default)]
pub struct InMemoryIssueSink {
    issues: Mutex<Vec<RecordedIssue>>,
}

impl InMemoryIssueSink {
    /// Create empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues recorded for a job
    #[must_use]
    pub fn issues_for(&self, job_id: JobId) -> Vec<RecordedIssue> {
        self.issues
            .lock()
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect()
    }

    /// Total issues across jobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.lock().len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.lock().is_empty()
    }
}

#[async_trait]
impl IssueSink for InMemoryIssueSink {
    async fn create_issue(&self, job_id: JobId, file: &FileTask, issue: &Issue) -> Result<(), StoreError> {
        self.issues.lock().push(RecordedIssue {
            job_id,
            path: file.path.clone(),
            issue: issue.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;
    use sift_recovery::Severity;

    #[tokio::test]
    async fn create_update_get() {
        let store = InMemoryTaskStore::new();
        let id = store.create_job().await.unwrap();
        assert_eq!(store.get_job(id).await.unwrap().status, JobStatus::Pending);

        store
            .update_job(id, JobUpdate::new().status(JobStatus::Running).total_files(4))
            .await
            .unwrap();

        let job = store.get_job(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.total_files, 4);
        assert_eq!(store.updates(id).len(), 1);
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let store = InMemoryTaskStore::new();
        let err = store.update_job(JobId::new(), JobUpdate::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn sink_filters_by_job() {
        let sink = InMemoryIssueSink::new();
        let file = FileTask::new("a.rs", "mem://a.rs");
        let issue = Issue::new("bug", Severity::High, "x");
        let a = JobId::new();

        sink.create_issue(a, &file, &issue).await.unwrap();
        sink.create_issue(JobId::new(), &file, &issue).await.unwrap();

        assert_eq!(sink.len(), 2);
        let recorded = sink.issues_for(a);
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].path, "a.rs");
    }
}
