//! The durable host boundary a saga executes against.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::retry::{RetryDecision, RetryPolicy};
use crate::step::StepError;

/// Result of a durable sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full duration elapsed.
    Elapsed,

    /// Cancellation was requested while sleeping.
    Cancelled,
}

/// Result of waiting for a named signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The signal was delivered while waiting.
    Received,

    /// The timeout elapsed before the signal arrived.
    TimedOut,

    /// Cancellation was requested while waiting.
    Cancelled,
}

/// Core trait for the runtime a saga executes on.
///
/// Orchestration logic touches time, signals, recorded side effects, and
/// observability tags only through this trait, which keeps it independent
/// of whichever host actually provides durability.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SagaRuntime: Send + Sync {
    /// Sleeps for the given duration on the runtime clock.
    async fn sleep(&self, duration: Duration) -> SleepOutcome;

    /// Waits for a named signal or a timeout, whichever comes first.
    ///
    /// A signal sent while no waiter is parked on its name must be
    /// dropped by the runtime, not queued for a later waiter.
    async fn await_signal(&self, name: &str, timeout: Duration) -> SignalOutcome;

    /// Returns a fresh UUID recorded as a side effect.
    ///
    /// Hosts that replay history must return the recorded value instead
    /// of minting a new one, so keys built from it stay stable across
    /// replays.
    fn record_uuid(&self) -> Uuid;

    /// Returns the current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Records an observability label for the currently executing step.
    async fn tag_step(&self, label: &str);

    /// Returns true once cancellation has been requested.
    fn cancellation_requested(&self) -> bool;
}

/// Options controlling a retried step invocation.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Retry policy applied to retryable failures.
    pub policy: RetryPolicy,

    /// Total budget for the step across all attempts, measured from the
    /// start of the first attempt. None means unbounded.
    pub schedule_to_close: Option<Duration>,
}

impl InvokeOptions {
    /// Creates options with the default policy and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with the default policy and the given deadline.
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            policy: RetryPolicy::default(),
            schedule_to_close: Some(deadline),
        }
    }
}

/// Error from a retried step invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The step failed and the policy declined to retry.
    #[error("step failed: {0}")]
    Failed(#[from] StepError),

    /// The schedule-to-close deadline ran out before an attempt succeeded.
    #[error("step budget exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// Cancellation was requested between or during attempts.
    #[error("step invocation cancelled")]
    Cancelled,
}

/// Extension trait driving the retry loop on top of a runtime.
#[async_trait]
pub trait SagaRuntimeExt: SagaRuntime {
    /// Invokes a step until it succeeds, the policy gives up, the
    /// deadline runs out, or the saga is cancelled.
    ///
    /// The closure is called once per attempt and must produce a fresh
    /// future each time. Backoff sleeps go through [`SagaRuntime::sleep`]
    /// so they participate in the host's timer semantics.
    async fn invoke_step<T, F, Fut>(
        &self,
        options: &InvokeOptions,
        mut attempt_fn: F,
    ) -> Result<T, InvokeError>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StepError>> + Send,
    {
        let started = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            if self.cancellation_requested() {
                return Err(InvokeError::Cancelled);
            }

            let error = match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match options.policy.decide(attempt, &error) {
                RetryDecision::GiveUp => return Err(InvokeError::Failed(error)),
                RetryDecision::Retry(delay) => {
                    if let Some(budget) = options.schedule_to_close
                        && started.elapsed() + delay >= budget
                    {
                        return Err(InvokeError::Exhausted { attempts: attempt });
                    }

                    tracing::debug!(
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %error,
                        "step attempt failed, backing off"
                    );

                    if let SleepOutcome::Cancelled = self.sleep(delay).await {
                        return Err(InvokeError::Cancelled);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

// Blanket implementation for all SagaRuntime implementations
impl<T: SagaRuntime + ?Sized> SagaRuntimeExt for T {}
