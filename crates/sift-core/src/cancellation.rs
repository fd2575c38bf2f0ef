//! Job-scoped cancellation
//!
//! Workers poll [`CancellationRegistry::is_cancelled`] at their checkpoints;
//! the set is sharded, so checks from many workers never contend on a single
//! lock. Share it with `Arc`.

use crate::types::JobId;
use dashmap::DashSet;
use tracing::{debug, info};

/// Set of cancelled job IDs
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    cancelled: DashSet<JobId>,
}

impl CancellationRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; returns `false` if already requested
    pub fn cancel(&self, job_id: JobId) -> bool {
        let fresh = self.cancelled.insert(job_id);
        if fresh {
            info!(%job_id, "cancellation requested");
        }
        fresh
    }

    /// Check if cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self, job_id: JobId) -> bool {
        self.cancelled.contains(&job_id)
    }

    /// Forget a job once it reached a terminal status
    pub fn cleanup(&self, job_id: JobId) -> bool {
        let removed = self.cancelled.remove(&job_id).is_some();
        if removed {
            debug!(%job_id, "cancellation entry cleaned up");
        }
        removed
    }

    /// Number of pending cancellations
    #[must_use]
    pub fn len(&self) -> usize {
        self.cancelled.len()
    }

    /// Check if no cancellation is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cancelled.is_empty()
    }
}
