//! Saga error types.

use runtime::StepError;
use thiserror::Error;

use crate::state::StepName;

/// Terminal errors a transfer saga can report.
///
/// Every variant is final: by the time one is returned the saga has
/// stopped executing and, where required, compensation has already run.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The validate step rejected the request.
    #[error("validation failed: {source}")]
    ValidationFailed {
        #[source]
        source: StepError,
    },

    /// No approval signal arrived within the deadline.
    #[error("transfer approval timed out after {timeout_secs}s")]
    ApprovalTimeout { timeout_secs: u64 },

    /// The deposit failed after the withdraw had committed. The withdraw
    /// has been compensated (or a compensation fault has been recorded).
    #[error("deposit failed: {source}")]
    DepositFailed {
        #[source]
        source: StepError,
    },

    /// A step ran out of its schedule-to-close budget across retries.
    #[error("step '{step}' exhausted its retry budget after {attempts} attempts")]
    StepExhausted { step: StepName, attempts: u32 },

    /// A step failed with an error the retry policy will not retry.
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: StepName,
        #[source]
        source: StepError,
    },

    /// The saga was cancelled while the given step was current.
    #[error("transfer cancelled during step '{step}'")]
    Cancelled { step: StepName },
}

impl SagaError {
    /// Returns a stable machine-readable failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SagaError::ValidationFailed { .. } => "ValidationFailed",
            SagaError::ApprovalTimeout { .. } => "ApprovalTimeout",
            SagaError::DepositFailed { .. } => "DepositFailed",
            SagaError::StepExhausted { .. } => "StepExhausted",
            SagaError::StepFailed { .. } => "StepFailed",
            SagaError::Cancelled { .. } => "Cancelled",
        }
    }
}

/// Error from a failed compensation attempt.
///
/// Never becomes the saga's primary error: it is surfaced through logs
/// and metrics while the originating failure is reported to the caller.
#[derive(Debug, Error)]
#[error("undo withdraw failed: {source}")]
pub struct CompensationError {
    #[source]
    pub source: StepError,
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
