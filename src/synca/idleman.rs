//! Bounded-backoff idle policy for a scheduler sweep that finds
//! nothing runnable.
//!
//! Grounded on `foundation_core::synca::idleman::Idleman`: wraps a
//! [`crate::retries::ExponentialBackoffDecider`] behind a `max_idles`
//! cap, advancing one step per empty sweep until the decider gives up
//! (`IdleState::Expired`), at which point a runner switches from a
//! bounded backoff wait to parking indefinitely on its
//! [`crate::synca::lock::LockSignal`] instead of continuing to poll.

use crate::retries::{ExponentialBackoffDecider, RetryDecider, RetryState};

#[derive(Clone, Debug)]
pub enum IdleState {
    Ongoing(Option<RetryState>),
    Expired,
}

pub struct Idleman {
    max_idles: u32,
    last_state: IdleState,
    retry_decider: ExponentialBackoffDecider,
}

impl Idleman {
    pub fn new(max_idles: u32, retry_decider: ExponentialBackoffDecider) -> Self {
        Self {
            max_idles,
            retry_decider,
            last_state: IdleState::Ongoing(None),
        }
    }

    pub fn state(&self) -> IdleState {
        self.last_state.clone()
    }

    /// Called once a sweep finds real work again: drops back to a
    /// fresh backoff sequence for the next idle stretch.
    pub fn reset(&mut self) {
        self.last_state = IdleState::Ongoing(None);
    }

    /// Advances the backoff by one step, returning the new state. Once
    /// `Expired`, further calls keep returning `Expired` until
    /// [`Idleman::reset`] is called.
    pub fn next_idle(&mut self) -> IdleState {
        match &self.last_state {
            IdleState::Ongoing(retry_state) => {
                let retry_state = retry_state
                    .clone()
                    .unwrap_or_else(|| RetryState::new(0, self.max_idles, None));

                self.last_state = match self.retry_decider.decide(retry_state) {
                    Some(inner) => IdleState::Ongoing(Some(inner)),
                    None => IdleState::Expired,
                };

                self.last_state.clone()
            }
            IdleState::Expired => IdleState::Expired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn decider() -> ExponentialBackoffDecider {
        ExponentialBackoffDecider::new(2, 0.5, Duration::from_millis(1), Some(Duration::from_millis(5)))
    }

    #[test]
    fn backs_off_then_expires_after_max_idles() {
        let mut idle = Idleman::new(2, decider());

        match idle.next_idle() {
            IdleState::Ongoing(Some(state)) => assert_eq!(state.attempt, 1),
            other => panic!("expected an ongoing backoff step, got {other:?}"),
        }
        match idle.next_idle() {
            IdleState::Ongoing(Some(state)) => assert_eq!(state.attempt, 2),
            other => panic!("expected an ongoing backoff step, got {other:?}"),
        }
        assert!(matches!(idle.next_idle(), IdleState::Expired));
        // Expired is sticky until reset.
        assert!(matches!(idle.next_idle(), IdleState::Expired));
    }

    #[test]
    fn reset_starts_a_fresh_backoff_sequence() {
        let mut idle = Idleman::new(1, decider());
        assert!(matches!(idle.next_idle(), IdleState::Ongoing(Some(_))));
        assert!(matches!(idle.next_idle(), IdleState::Expired));

        idle.reset();
        assert!(matches!(idle.next_idle(), IdleState::Ongoing(Some(_))));
    }
}
