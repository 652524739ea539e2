//! Human approval gate.

use std::time::Duration;

use runtime::{SagaRuntime, SignalOutcome};

/// Name of the signal that approves a waiting transfer.
pub const APPROVE_TRANSFER_SIGNAL: &str = "approveTransfer";

/// Default time a transfer waits for approval before failing.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one approval wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The approval signal arrived in time.
    Approved,
    /// The deadline passed with no approval.
    TimedOut,
    /// The saga was cancelled while waiting.
    Cancelled,
}

/// Waits for the approval signal with a deadline.
///
/// The gate only listens while the saga is parked on it. A signal sent
/// at any other time never reaches a waiter and is dropped by the
/// runtime, which is what makes early or repeated approvals harmless.
#[derive(Debug, Clone)]
pub struct ApprovalGate {
    timeout: Duration,
}

impl ApprovalGate {
    /// Creates a gate with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Parks on the approval signal until it arrives or the deadline hits.
    pub async fn wait<R: SagaRuntime>(&self, runtime: &R) -> GateOutcome {
        tracing::info!(
            timeout_secs = self.timeout.as_secs(),
            "waiting for approval signal"
        );

        match runtime.await_signal(APPROVE_TRANSFER_SIGNAL, self.timeout).await {
            SignalOutcome::Received => GateOutcome::Approved,
            SignalOutcome::TimedOut => GateOutcome::TimedOut,
            SignalOutcome::Cancelled => GateOutcome::Cancelled,
        }
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::LocalRuntime;

    #[tokio::test(start_paused = true)]
    async fn test_approved_when_signal_arrives() {
        let runtime = LocalRuntime::new();
        let gate = ApprovalGate::default();

        let waiter = {
            let runtime = runtime.clone();
            tokio::spawn(async move { gate.wait(&runtime).await })
        };
        tokio::task::yield_now().await;

        runtime.signal(APPROVE_TRANSFER_SIGNAL);

        assert_eq!(waiter.await.unwrap(), GateOutcome::Approved);
        assert_eq!(runtime.ignored_signals(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_without_signal() {
        let runtime = LocalRuntime::new();
        let gate = ApprovalGate::new(Duration::from_secs(5));

        assert_eq!(gate.wait(&runtime).await, GateOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_signal_does_not_preapprove() {
        let runtime = LocalRuntime::new();

        // Nobody is waiting yet, so the signal is dropped.
        runtime.signal(APPROVE_TRANSFER_SIGNAL);
        assert_eq!(runtime.ignored_signals(), 1);

        let gate = ApprovalGate::new(Duration::from_secs(5));
        assert_eq!(gate.wait(&runtime).await, GateOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting() {
        let runtime = LocalRuntime::new();
        let gate = ApprovalGate::default();

        let waiter = {
            let runtime = runtime.clone();
            tokio::spawn(async move { gate.wait(&runtime).await })
        };
        tokio::task::yield_now().await;

        runtime.cancel();

        assert_eq!(waiter.await.unwrap(), GateOutcome::Cancelled);
    }
}
