//! Bounded retry/backoff primitives, kept from the teacher codebase to
//! back [`crate::synca::idleman::Idleman`]'s empty-sweep policy.

mod core;
mod exponential;

pub use core::{RetryDecider, RetryState, DEFAULT_MIN_DURATION};
pub use exponential::ExponentialBackoffDecider;
