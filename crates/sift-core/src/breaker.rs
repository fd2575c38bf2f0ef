//! Circuit breaker for a single scan job
//!
//! Counts consecutive and cumulative per-file failures and decides when a
//! scan has failed often enough that continuing would only burn analyzer
//! calls. Thresholds are evaluated on failures only; a success resets the
//! consecutive count. A tripped breaker never resets.

use crate::config::BreakerConfig;
use serde::{Deserialize, Serialize};

/// Failure counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureState {
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Files attempted
    pub total_attempts: u32,
    /// Files that failed
    pub total_failures: u32,
}

impl FailureState {
    /// Fraction of attempts that failed
    #[must_use]
    pub fn failure_ratio(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            f64::from(self.total_failures) / f64::from(self.total_attempts)
        }
    }
}

/// Outcome of recording one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakerDecision {
    /// Keep going
    Continue,
    /// Too many failures in a row
    TripConsecutive,
    /// Failure ratio over the limit
    TripRatio,
}

impl BreakerDecision {
    /// Check if the breaker tripped
    #[inline]
    #[must_use]
    pub fn is_trip(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Per-job failure accounting
#[derive(Debug, Clone)]
pub struct FailureAccountant {
    config: BreakerConfig,
    state: FailureState,
    tripped: Option<BreakerDecision>,
}

impl FailureAccountant {
    /// Create with thresholds
    #[must_use]
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: FailureState::default(),
            tripped: None,
        }
    }

    /// Record one attempt
    ///
    /// After a trip the counters freeze and the same decision is returned.
    pub fn record(&mut self, success: bool) -> BreakerDecision {
        if let Some(decision) = self.tripped {
            return decision;
        }

        self.state.total_attempts = self.state.total_attempts.saturating_add(1);
        if success {
            self.state.consecutive_failures = 0;
            return BreakerDecision::Continue;
        }
        self.state.total_failures = self.state.total_failures.saturating_add(1);
        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);

        let decision = self.evaluate();
        if decision.is_trip() {
            self.tripped = Some(decision);
        }
        decision
    }

    fn evaluate(&self) -> BreakerDecision {
        if self.state.consecutive_failures >= self.config.max_consecutive_failures {
            BreakerDecision::TripConsecutive
        } else if self.state.total_attempts > self.config.min_attempts_for_ratio
            && self.state.failure_ratio() > self.config.max_failure_ratio
        {
            BreakerDecision::TripRatio
        } else {
            BreakerDecision::Continue
        }
    }

    /// Current counters
    #[inline]
    #[must_use]
    pub fn state(&self) -> FailureState {
        self.state
    }

    /// Check if the breaker tripped
    #[inline]
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.is_some()
    }

    /// Human-readable reason for the trip, naming threshold and counts
    #[must_use]
    pub fn trip_message(&self) -> Option<String> {
        let s = &self.state;
        match self.tripped? {
            BreakerDecision::TripConsecutive => Some(format!(
                "circuit breaker tripped: {} consecutive failures (limit {}); {} of {} files failed",
                s.consecutive_failures,
                self.config.max_consecutive_failures,
                s.total_failures,
                s.total_attempts,
            )),
            BreakerDecision::TripRatio => Some(format!(
                "circuit breaker tripped: failure ratio {:.0}% exceeds {:.0}% after {} attempts ({} failures)",
                s.failure_ratio() * 100.0,
                self.config.max_failure_ratio * 100.0,
                s.total_attempts,
                s.total_failures,
            )),
            BreakerDecision::Continue => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn accountant() -> FailureAccountant {
        FailureAccountant::new(BreakerConfig::default())
    }

    #[test]
    fn five_consecutive_failures_trip() {
        let mut acc = accountant();
        for _ in 0..4 {
            assert_eq!(acc.record(false), BreakerDecision::Continue);
        }
        assert_eq!(acc.record(false), BreakerDecision::TripConsecutive);

        let message = acc.trip_message().unwrap();
        assert!(message.contains("5 consecutive failures"));
        assert!(message.contains("limit 5"));
    }

    #[test]
    fn success_resets_consecutive_count() {
        let mut acc = accountant();
        for _ in 0..4 {
            acc.record(false);
        }
        acc.record(true);
        assert_eq!(acc.state().consecutive_failures, 0);
        assert_eq!(acc.record(false), BreakerDecision::Continue);
    }

    #[test]
    fn ratio_needs_more_than_min_attempts() {
        let mut acc = accountant();
        // F F S F F S F F S F: 10 attempts, 7 failures, never 5 in a row
        for success in [false, false, true, false, false, true, false, false, true, false] {
            assert_eq!(acc.record(success), BreakerDecision::Continue);
        }
        assert_eq!(acc.record(false), BreakerDecision::TripRatio);
        assert!(acc.trip_message().unwrap().contains("exceeds 50%"));
    }

    #[test]
    fn six_of_eleven_trips_ratio() {
        let mut acc = accountant();
        for _ in 0..5 {
            assert_eq!(acc.record(true), BreakerDecision::Continue);
            assert_eq!(acc.record(false), BreakerDecision::Continue);
        }
        assert_eq!(acc.record(false), BreakerDecision::TripRatio);
        assert_eq!(acc.state().total_attempts, 11);
        assert_eq!(acc.state().total_failures, 6);
    }

    #[test]
    fn consecutive_trip_after_prior_successes() {
        let mut acc = accountant();
        for _ in 0..10 {
            acc.record(true);
        }
        for _ in 0..4 {
            assert_eq!(acc.record(false), BreakerDecision::Continue);
        }
        assert_eq!(acc.record(false), BreakerDecision::TripConsecutive);
    }

    #[test]
    fn exactly_half_does_not_trip() {
        let mut acc = accountant();
        for i in 0..20 {
            assert_eq!(acc.record(i % 2 == 0), BreakerDecision::Continue);
        }
        assert_eq!(acc.state().total_failures, 10);
    }

    #[test]
    fn trip_is_sticky() {
        let mut acc = accountant();
        for _ in 0..5 {
            acc.record(false);
        }
        let frozen = acc.state();

        assert_eq!(acc.record(true), BreakerDecision::TripConsecutive);
        assert_eq!(acc.state(), frozen);
        assert!(acc.is_tripped());
    }

    #[test]
    fn no_message_before_trip() {
        let mut acc = accountant();
        acc.record(false);
        assert!(acc.trip_message().is_none());
    }

    proptest! {
        #[test]
        fn counters_stay_consistent(outcomes in prop::collection::vec(any::<bool>(), 0..64)) {
            let mut acc = accountant();
            let mut first_trip = None;
            for success in outcomes {
                let decision = acc.record(success);
                if let Some(trip) = first_trip {
                    prop_assert_eq!(decision, trip);
                } else if decision.is_trip() {
                    prop_assert!(!success);
                    first_trip = Some(decision);
                }
            }

            let s = acc.state();
            prop_assert!(s.total_failures <= s.total_attempts);
            prop_assert!(s.consecutive_failures <= s.total_failures);
            prop_assert!(s.consecutive_failures <= 5);
        }
    }
}
