//! Exponential backoff with jitter.
//!
//! Grounded on `foundation_core::retries::exponential::ExponentialBackoffDecider`,
//! carried over with the teacher's own `fastrand`-backed jitter rather
//! than hand-rolling one.

use std::cell::RefCell;
use std::time::Duration;

use super::core::{RetryDecider, RetryState, DEFAULT_MIN_DURATION};

const DEFAULT_JITTER: f32 = 0.6;
const DEFAULT_FACTOR: u32 = 2;

#[derive(Clone, Debug)]
pub struct ExponentialBackoffDecider {
    factor: u32,
    jitter: f32,
    min_duration: Duration,
    max_duration: Duration,
    rng: RefCell<fastrand::Rng>,
}

impl Default for ExponentialBackoffDecider {
    fn default() -> Self {
        Self::new(DEFAULT_FACTOR, DEFAULT_JITTER, DEFAULT_MIN_DURATION, None)
    }
}

impl ExponentialBackoffDecider {
    pub fn new(
        factor: u32,
        jitter: f32,
        min_duration: Duration,
        max_duration: impl Into<Option<Duration>>,
    ) -> Self {
        assert!(
            jitter > 0f32 && jitter < 1f32,
            "<exponential-backoff>: jitter must be between 0 and 1."
        );
        Self {
            factor,
            jitter,
            min_duration,
            rng: RefCell::new(fastrand::Rng::new()),
            max_duration: max_duration.into().unwrap_or(Duration::MAX),
        }
    }

    pub fn from_duration(
        min_duration: Duration,
        max_duration: impl Into<Option<Duration>>,
    ) -> Self {
        Self::new(DEFAULT_FACTOR, DEFAULT_JITTER, min_duration, max_duration)
    }
}

impl RetryDecider for ExponentialBackoffDecider {
    fn decide(&self, state: RetryState) -> Option<RetryState> {
        let last_attempt = state.attempt;
        if last_attempt >= state.total_allowed {
            return None;
        }

        let next_attempt = last_attempt.saturating_add(1);

        let exponent = self.factor.saturating_pow(next_attempt);
        let duration = self.min_duration.saturating_mul(exponent);

        // Apply jitter - use multiples of 100 to avoid relying on floats.
        let jitter_factor = (self.jitter * 100f32) as u32;
        let random = self.rng.borrow_mut().u32(0..jitter_factor * 2);

        let mut duration = duration.saturating_mul(100);
        if random < jitter_factor {
            let jitter = duration.saturating_mul(random) / 100;
            duration = duration.saturating_sub(jitter);
        } else {
            let jitter = duration.saturating_mul(random / 2) / 100;
            duration = duration.saturating_add(jitter);
        }
        duration /= 100;

        duration = duration.clamp(self.min_duration, self.max_duration);

        Some(RetryState {
            wait: Some(duration),
            attempt: next_attempt,
            total_allowed: state.total_allowed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backs_off_until_the_attempt_budget_is_spent() {
        let decider = ExponentialBackoffDecider::default();

        let base = RetryState::new(0, 2, None);

        let first = decider.decide(base).expect("first attempt should be allowed");
        assert!(first.wait.is_some());
        assert_eq!(first.attempt, 1);

        let second = decider.decide(first).expect("second attempt should be allowed");
        assert!(second.wait.is_some());
        assert_eq!(second.attempt, 2);

        assert!(decider.decide(second).is_none());
    }
}
