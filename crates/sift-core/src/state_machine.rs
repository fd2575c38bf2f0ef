//! Job lifecycle
//!
//! ```text
//! Pending → Running → Completed
//!    │         ├────→ Failed
//!    │         └────→ Cancelled
//!    └──────→ Failed | Cancelled
//! ```

use crate::error::ScanError;
use crate::types::JobStatus;

/// Validates a job status transition
pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), ScanError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ScanError::IllegalTransition { from, to })
    }
}

/// Statuses reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: JobStatus) -> Vec<JobStatus> {
    use JobStatus::*;
    match from {
        Pending => vec![Running, Failed, Cancelled],
        Running => vec![Completed, Failed, Cancelled],
        Completed | Failed | Cancelled => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Running),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
            Just(JobStatus::Cancelled),
        ]
    }

    #[test]
    fn happy_path() {
        assert!(validate_transition(JobStatus::Pending, JobStatus::Running).is_ok());
        assert!(validate_transition(JobStatus::Running, JobStatus::Completed).is_ok());
    }

    #[test]
    fn running_cannot_go_back() {
        assert!(validate_transition(JobStatus::Running, JobStatus::Pending).is_err());
    }

    proptest! {
        #[test]
        fn terminal_statuses_are_final(from in status(), to in status()) {
            if from.is_terminal() {
                prop_assert!(validate_transition(from, to).is_err());
            }
        }

        #[test]
        fn walks_end_in_a_terminal_status(steps in prop::collection::vec(status(), 0..12)) {
            let mut current = JobStatus::Pending;
            for next in steps {
                if validate_transition(current, next).is_ok() {
                    prop_assert_ne!(current, next);
                    current = next;
                }
            }
            prop_assert!(allowed_transitions(current).is_empty() == current.is_terminal());
        }
    }
}
