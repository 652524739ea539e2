//! Step-level errors crossing the service boundary.

use thiserror::Error;

/// Error returned by a saga step collaborator.
///
/// The collaborator classifies the failure itself: `retryable` failures
/// are fed back into the retry policy, non-retryable ones abort the step
/// immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct StepError {
    /// Machine-readable failure class (e.g. `"service_unavailable"`).
    pub kind: String,

    /// Human-readable detail for logs.
    pub message: String,

    /// Whether the invoker may retry the step.
    pub retryable: bool,
}

impl StepError {
    /// Creates a retryable step error.
    pub fn retryable(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable step error.
    pub fn non_retryable(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the invoker may retry the step.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_constructor_sets_flag() {
        let err = StepError::retryable("service_unavailable", "ledger is down");
        assert!(err.is_retryable());
        assert_eq!(err.kind, "service_unavailable");
    }

    #[test]
    fn non_retryable_constructor_clears_flag() {
        let err = StepError::non_retryable("invalid_account", "no such account");
        assert!(!err.is_retryable());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = StepError::retryable("timeout", "no response after 5s");
        assert_eq!(err.to_string(), "timeout: no response after 5s");
    }
}
