//! Scan orchestration
//!
//! Runs a fixed-size pool of workers over the file list of one job:
//! - Workers claim files through a shared atomic cursor, so each file is
//!   attempted at most once
//! - Every finished file is committed under one async mutex (counters,
//!   issues, store update and breaker decision together)
//! - Cancellation is checked before each file, after each analyzer call and
//!   again inside the commit
//! - A tripped circuit breaker aborts the remaining workers

use crate::breaker::{FailureAccountant, FailureState};
use crate::cancellation::CancellationRegistry;
use crate::config::ScanConfig;
use crate::error::{FileFailure, ScanError, ScanResult, StoreError};
use crate::language::language_hint;
use crate::ports::{Analyzer, ContentFetcher, IssueSink, TaskStore};
use crate::state_machine::validate_transition;
use crate::types::{final_quality_score, FileTask, JobId, JobStatus, JobUpdate, ScanJob};
use chrono::Utc;
use sift_recovery::{AnalysisResult, RecoveryParser};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// A file that was skipped
#[derive(Debug)]
pub struct FailedFile {
    /// Repository-relative path
    pub path: String,
    /// Why it was skipped
    pub failure: FileFailure,
}

/// Result of a finished scan
#[derive(Debug)]
pub struct ScanOutcome {
    /// Final job record, as persisted
    pub job: ScanJob,
    /// Skipped files in commit order
    pub failures: Vec<FailedFile>,
    /// Breaker counters at the end of the scan
    pub breaker: FailureState,
}

impl ScanOutcome {
    /// Terminal status
    #[inline]
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.job.status
    }

    /// Check if every file was attempted
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.job.status == JobStatus::Completed
    }
}

/// Handle to a scan running in the background
#[derive(Debug)]
pub struct ScanHandle {
    job_id: JobId,
    task: JoinHandle<ScanResult<ScanOutcome>>,
}

impl ScanHandle {
    /// Job being scanned
    #[inline]
    #[must_use]
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Check if the scan finished
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scan to finish
    pub async fn wait(self) -> ScanResult<ScanOutcome> {
        self.task.await.map_err(|e| ScanError::Task(e.to_string()))?
    }
}

/// What happened to one file before commit
enum FileOutcome {
    Analyzed { lines: usize, result: AnalysisResult },
    Failed(FileFailure),
    /// Stopped at the post-analysis checkpoint
    Discarded,
}

/// Mutable per-job state, only touched under the commit lock
struct Ledger {
    job: ScanJob,
    accountant: FailureAccountant,
    failures: Vec<FailedFile>,
}

/// Shared state of one running scan
struct ScanRun {
    job_id: JobId,
    files: Vec<FileTask>,
    cursor: AtomicUsize,
    tripped: AtomicBool,
    ledger: Mutex<Ledger>,
}

/// Bounded-concurrency scan orchestrator
///
/// Cloning is cheap; clones share collaborators and the cancellation
/// registry.
#[derive(Clone)]
pub struct ScanOrchestrator {
    analyzer: Arc<dyn Analyzer>,
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn TaskStore>,
    issues: Arc<dyn IssueSink>,
    cancellations: Arc<CancellationRegistry>,
    parser: Arc<RecoveryParser>,
    config: ScanConfig,
}

impl std::fmt::Debug for ScanOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanOrchestrator")
            .field("config", &self.config)
            .field("strategies", &self.parser.strategy_names())
            .field("pending_cancellations", &self.cancellations.len())
            .finish_non_exhaustive()
    }
}

impl ScanOrchestrator {
    /// Create with default config, parser and a fresh cancellation registry
    #[must_use]
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<dyn TaskStore>,
        issues: Arc<dyn IssueSink>,
    ) -> Self {
        Self {
            analyzer,
            fetcher,
            store,
            issues,
            cancellations: Arc::new(CancellationRegistry::new()),
            parser: Arc::new(RecoveryParser::new()),
            config: ScanConfig::default(),
        }
    }

    /// With config
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// With a shared cancellation registry
    #[inline]
    #[must_use]
    pub fn with_cancellations(mut self, cancellations: Arc<CancellationRegistry>) -> Self {
        self.cancellations = cancellations;
        self
    }

    /// With a custom parser
    #[inline]
    #[must_use]
    pub fn with_parser(mut self, parser: RecoveryParser) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Config in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Cancellation registry
    #[inline]
    #[must_use]
    pub fn cancellations(&self) -> &Arc<CancellationRegistry> {
        &self.cancellations
    }

    /// Request cancellation of a pending or running job
    ///
    /// Returns `false` if the request was already registered, or if the job
    /// is unknown or already terminal. Late requests are dropped so the
    /// registry only ever holds jobs that have not finished.
    pub async fn cancel(&self, job_id: JobId) -> bool {
        let fresh = self.cancellations.cancel(job_id);

        // `finish` persists the terminal status before cleaning up, so a
        // request inserted after that cleanup sees the terminal status here
        match self.store.get_job(job_id).await {
            Ok(job) if job.status.is_terminal() => {
                debug!(%job_id, status = %job.status, "job already finished; dropping cancellation");
                self.cancellations.cleanup(job_id);
                false
            }
            Ok(_) => fresh,
            Err(StoreError::NotFound(_)) => {
                debug!(%job_id, "unknown job; dropping cancellation");
                self.cancellations.cleanup(job_id);
                false
            }
            Err(e) => {
                warn!(%job_id, error = %e, "cannot read job; keeping cancellation");
                fresh
            }
        }
    }

    /// Create a job and scan it in the background
    ///
    /// An invalid config is rejected before any job is created.
    pub async fn start(&self, files: Vec<FileTask>) -> ScanResult<ScanHandle> {
        self.config.validate()?;
        let job_id = self.store.create_job().await?;
        let this = self.clone();
        let task = tokio::spawn(async move { this.execute(job_id, files).await });
        Ok(ScanHandle { job_id, task })
    }

    /// Scan an existing pending job to completion
    ///
    /// Returns an error only when the config is invalid, the job cannot be
    /// started or its terminal status cannot be persisted; per-file failures
    /// end up in [`ScanOutcome::failures`]. An invalid config leaves the job
    /// pending.
    pub async fn execute(&self, job_id: JobId, files: Vec<FileTask>) -> ScanResult<ScanOutcome> {
        self.config.validate()?;
        let mut job = self.store.get_job(job_id).await?;
        validate_transition(job.status, JobStatus::Running)?;

        let total = files.len();
        job.status = JobStatus::Running;
        job.total_files = total;
        job.scanned_files = 0;
        job.failed_files = 0;
        job.total_lines = 0;
        job.issues_count = 0;
        job.started_at = Some(Utc::now());

        let mut update = JobUpdate::progress(&job).status(JobStatus::Running).total_files(total);
        update.started_at = job.started_at;
        self.store.update_job(job_id, update).await?;

        let workers = self.config.concurrency.min(total);
        info!(%job_id, total_files = total, workers, "scan started");

        let run = Arc::new(ScanRun {
            job_id,
            files,
            cursor: AtomicUsize::new(0),
            tripped: AtomicBool::new(false),
            ledger: Mutex::new(Ledger {
                job,
                accountant: FailureAccountant::new(self.config.breaker),
                failures: Vec::new(),
            }),
        });

        let mut set = JoinSet::new();
        for worker in 0..workers {
            set.spawn(self.clone().worker(Arc::clone(&run), worker));
        }
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!(%job_id, error = %e, "scan worker panicked");
                }
            }
            if run.tripped.load(Ordering::Acquire) {
                set.abort_all();
            }
        }

        self.finish(&run).await
    }

    /// Decide and persist the terminal status
    ///
    /// A trip already recorded wins over a cancellation that arrives later.
    async fn finish(&self, run: &ScanRun) -> ScanResult<ScanOutcome> {
        let job_id = run.job_id;
        let mut ledger = run.ledger.lock().await;

        let trip = ledger.accountant.trip_message();
        let status = if trip.is_some() {
            JobStatus::Failed
        } else if self.cancellations.is_cancelled(job_id) {
            JobStatus::Cancelled
        } else {
            JobStatus::Completed
        };
        validate_transition(ledger.job.status, status)?;

        ledger.job.status = status;
        ledger.job.finished_at = Some(Utc::now());
        if status == JobStatus::Completed {
            ledger.job.quality_score = Some(final_quality_score(ledger.job.issues_count));
        }
        ledger.job.error_message = trip;

        let persisted = self.store.update_job(job_id, JobUpdate::terminal(&ledger.job)).await;
        self.cancellations.cleanup(job_id);
        if let Err(e) = persisted {
            error!(%job_id, error = %e, "failed to persist terminal status");
            return Err(e.into());
        }

        info!(
            %job_id,
            status = %status,
            scanned_files = ledger.job.scanned_files,
            failed_files = ledger.job.failed_files,
            issues = ledger.job.issues_count,
            "scan finished"
        );

        Ok(ScanOutcome {
            job: ledger.job.clone(),
            failures: std::mem::take(&mut ledger.failures),
            breaker: ledger.accountant.state(),
        })
    }

    async fn worker(self, run: Arc<ScanRun>, worker: usize) {
        let delay = self.config.inter_file_delay();

        loop {
            if self.should_stop(&run) {
                debug!(job_id = %run.job_id, worker, "worker stopping");
                break;
            }
            let index = run.cursor.fetch_add(1, Ordering::AcqRel);
            let Some(file) = run.files.get(index) else {
                break;
            };

            let outcome = self.scan_file(&run, file).await;
            self.commit(&run, file, outcome).await;

            if !delay.is_zero() && run.cursor.load(Ordering::Acquire) < run.files.len() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    fn should_stop(&self, run: &ScanRun) -> bool {
        run.tripped.load(Ordering::Acquire) || self.cancellations.is_cancelled(run.job_id)
    }

    async fn scan_file(&self, run: &ScanRun, file: &FileTask) -> FileOutcome {
        let content = match self.fetcher.fetch(file).await {
            Ok(content) => content,
            Err(e) => return FileOutcome::Failed(e.into()),
        };

        let response = self.analyzer.analyze_file(file, &content, language_hint(&file.path)).await;
        if self.should_stop(run) {
            return FileOutcome::Discarded;
        }
        let raw = match response {
            Ok(raw) => raw,
            Err(e) => return FileOutcome::Failed(e.into()),
        };

        match self.parser.recover(&raw) {
            Ok(recovered) => {
                debug!(job_id = %run.job_id, path = %file.path, strategy = recovered.strategy, "response recovered");
                FileOutcome::Analyzed {
                    lines: content.lines().count(),
                    result: recovered.result,
                }
            }
            Err(failure) => FileOutcome::Failed(failure.into()),
        }
    }

    async fn commit(&self, run: &ScanRun, file: &FileTask, outcome: FileOutcome) {
        let job_id = run.job_id;
        let mut ledger = run.ledger.lock().await;

        if self.should_stop(run) {
            debug!(%job_id, path = %file.path, "discarding result of stopped scan");
            return;
        }

        match outcome {
            FileOutcome::Discarded => {}
            FileOutcome::Analyzed { lines, result } => {
                for issue in &result.issues {
                    if let Err(e) = self.issues.create_issue(job_id, file, issue).await {
                        error!(%job_id, path = %file.path, error = %e, "failed to store issue");
                    }
                }
                ledger.job.scanned_files += 1;
                ledger.job.total_lines += lines;
                ledger.job.issues_count += result.issues.len();
                self.persist_progress(&ledger.job).await;
                ledger.accountant.record(true);

                debug!(
                    %job_id,
                    path = %file.path,
                    issues = result.issues.len(),
                    scanned_files = ledger.job.scanned_files,
                    "file committed"
                );
            }
            FileOutcome::Failed(failure) => {
                log_failure(job_id, &file.path, &failure);
                ledger.job.failed_files += 1;
                self.persist_progress(&ledger.job).await;

                let decision = ledger.accountant.record(false);
                ledger.failures.push(FailedFile {
                    path: file.path.clone(),
                    failure,
                });
                if decision.is_trip() {
                    run.tripped.store(true, Ordering::Release);
                    error!(
                        %job_id,
                        reason = %ledger.accountant.trip_message().unwrap_or_default(),
                        "circuit breaker tripped"
                    );
                }
            }
        }
    }

    async fn persist_progress(&self, job: &ScanJob) {
        if let Err(e) = self.store.update_job(job.id, JobUpdate::progress(job)).await {
            error!(job_id = %job.id, error = %e, "failed to persist progress");
        }
    }
}

fn log_failure(job_id: JobId, path: &str, failure: &FileFailure) {
    match failure {
        FileFailure::Unparseable(f) => warn!(
            %job_id,
            path,
            raw_len = f.raw_len,
            open_braces = f.open_braces,
            close_braces = f.close_braces,
            first_char = ?f.first_char,
            last_char = ?f.last_char,
            likely_truncated = f.likely_truncated,
            strategies = ?f.strategies_tried,
            last_error = %f.last_error,
            head = %f.head,
            tail = %f.tail,
            hint = f.hint(),
            "unparseable analyzer response; file skipped"
        ),
        other => warn!(%job_id, path, kind = other.kind(), error = %other, "file skipped"),
    }
}
