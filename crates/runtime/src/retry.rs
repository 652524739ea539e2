//! Retry policy for saga step invocations.

use std::time::Duration;

use crate::step::StepError;

/// Exponential backoff policy applied to retryable step failures.
///
/// The first retry waits the initial interval; every later delay is the
/// previous one multiplied by the backoff coefficient, clamped to the max
/// interval. Attempts themselves are unbounded. Bounding a step happens
/// through the schedule-to-close deadline on the invocation, not through
/// the policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,

    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_coefficient: f64,

    /// Upper bound for any single delay.
    pub max_interval: Duration,
}

/// Outcome of consulting the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then run the next attempt.
    Retry(Duration),

    /// Stop retrying and surface the failure.
    GiveUp,
}

impl RetryPolicy {
    /// Creates a policy from explicit intervals.
    pub fn new(initial_interval: Duration, backoff_coefficient: f64, max_interval: Duration) -> Self {
        Self {
            initial_interval,
            backoff_coefficient,
            max_interval,
        }
    }

    /// Returns the decision for the given failed attempt (1-based).
    pub fn decide(&self, attempt: u32, error: &StepError) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry(self.delay_for(attempt))
    }

    /// Returns the backoff delay after the given attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Exponent is clamped so the f64 math cannot overflow to infinity.
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let factor = self.backoff_coefficient.powi(exponent);
        let delay = self.initial_interval.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_interval.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            max_interval: Duration::from_secs(30),
        }
    }
}
