//! Sift Core - scan orchestration
//!
//! Drives a text-generation analyzer over a list of files:
//! - Bounded-concurrency workers over a shared cursor
//! - Recovery of structured results from raw responses
//! - Circuit breaking on repeated per-file failures
//! - Cooperative, job-scoped cancellation
//! - Incremental progress persisted through a task store
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(analyzer: Arc<dyn Analyzer>) -> Result<(), Box<dyn std::error::Error>> {
//! let files = LocalFileLister::new("src").with_extensions(["rs"]).list().await?;
//! let orchestrator = ScanOrchestrator::new(
//!     analyzer,
//!     Arc::new(LocalFetcher),
//!     Arc::new(InMemoryTaskStore::new()),
//!     Arc::new(InMemoryIssueSink::new()),
//! );
//!
//! let handle = orchestrator.start(files).await?;
//! let outcome = handle.wait().await?;
//! println!("{} issues in {} files", outcome.job.issues_count, outcome.job.scanned_files);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod breaker;
pub mod cancellation;
pub mod config;
pub mod error;
pub mod language;
pub mod local;
pub mod memory;
pub mod orchestrator;
pub mod ports;
pub mod state_machine;
pub mod types;

// Re-exports for convenience
pub use breaker::{BreakerDecision, FailureAccountant, FailureState};
pub use cancellation::CancellationRegistry;
pub use config::{BreakerConfig, ScanConfig};
pub use error::{AnalyzerError, ConfigError, FetchError, FileFailure, ScanError, ScanResult, StoreError};
pub use language::language_hint;
pub use local::{LocalFetcher, LocalFileLister};
pub use memory::{InMemoryIssueSink, InMemoryTaskStore, RecordedIssue};
pub use orchestrator::{FailedFile, ScanHandle, ScanOrchestrator, ScanOutcome};
pub use ports::{Analyzer, ContentFetcher, FileLister, IssueSink, TaskStore};
pub use types::{final_quality_score, FileTask, JobId, JobStatus, JobUpdate, ScanJob};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Sift Core
    pub use crate::{
        Analyzer, AnalyzerError, CancellationRegistry, ContentFetcher, FileLister, FileTask,
        InMemoryIssueSink, InMemoryTaskStore, IssueSink, JobId, JobStatus, LocalFetcher,
        LocalFileLister, ScanConfig, ScanOrchestrator, ScanOutcome, TaskStore,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
