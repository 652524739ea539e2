//! Transfer lifecycle states and step names.

use serde::{Deserialize, Serialize};

use crate::status::TransferStatus;

/// Externally visible state of a transfer saga.
///
/// State transitions:
/// ```text
/// Running ──┬───────────────────► Finished
///           ├──► Waiting ──► Running
///           └───────────────────► Failed
/// ```
///
/// `Waiting` is only entered while the saga is parked on the approval
/// gate; an approval timeout moves it straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    /// Saga steps are being executed.
    #[default]
    Running,

    /// The saga is parked waiting for a human approval signal.
    Waiting,

    /// The transfer completed (terminal state).
    Finished,

    /// The transfer failed (terminal state).
    Failed,
}

impl TransferState {
    /// Returns true if an approval signal is consumable in this state.
    pub fn accepts_approval(&self) -> bool {
        matches!(self, TransferState::Waiting)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Finished | TransferState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Running => "running",
            TransferState::Waiting => "waiting",
            TransferState::Finished => "finished",
            TransferState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transfer saga steps in execution order.
///
/// `AwaitApproval` and `Compensate` are only visited on some paths, but
/// declaration order always matches execution order, so the derived
/// `Ord` answers "has this step been reached yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    /// Pre-flight checks on the request and accounts.
    Validate,

    /// Parked on the human approval gate.
    AwaitApproval,

    /// Debit of the source account.
    Withdraw,

    /// Credit of the target account.
    Deposit,

    /// Reversal of a committed withdraw after a failure.
    Compensate,

    /// Customer confirmation.
    Notify,
}

impl StepName {
    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Validate => "validate",
            StepName::AwaitApproval => "await_approval",
            StepName::Withdraw => "withdraw",
            StepName::Deposit => "deposit",
            StepName::Compensate => "compensate",
            StepName::Notify => "notify",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable bookkeeping for one saga instance.
///
/// Owned exclusively by the coordinator; observers only ever see the
/// [`TransferStatus`] snapshots it publishes.
#[derive(Debug, Clone)]
pub(crate) struct SagaState {
    pub current_step: StepName,
    pub progress: u8,
    pub state: TransferState,
    pub approved: bool,
    pub charge_id: Option<String>,
}

impl SagaState {
    pub fn new() -> Self {
        Self {
            current_step: StepName::Validate,
            progress: 0,
            state: TransferState::Running,
            approved: false,
            charge_id: None,
        }
    }

    /// Builds the snapshot published for the current state.
    pub fn snapshot(&self, approval_timeout_secs: u64) -> TransferStatus {
        TransferStatus {
            progress_percentage: self.progress,
            transfer_state: self.state,
            charge_id: self.charge_id.clone(),
            approval_timeout_secs,
        }
    }
}
