//! Money transfer saga.
//!
//! This crate orchestrates a durable money transfer:
//! 1. Validate the request
//! 2. Optionally wait for a human approval signal
//! 3. Withdraw from the source account
//! 4. Deposit into the target account
//! 5. Notify the customer
//!
//! Each step runs under a retry policy through an injected
//! [`runtime::SagaRuntime`], so the same coordinator drives production
//! hosts and deterministic tests alike. If the deposit cannot complete
//! after the withdraw has committed, the withdraw is compensated and the
//! saga fails with the deposit error. A failed notification never fails
//! the saga; the transfer completes with a warning instead.
//!
//! Observers follow the transfer through [`StatusSubscription`] snapshots
//! published by the single coordinator writer.

pub mod approval;
pub mod compensation;
pub mod coordinator;
pub mod error;
pub mod scenario;
pub mod services;
pub mod state;
pub mod status;
pub mod transfer;

pub use approval::{APPROVE_TRANSFER_SIGNAL, ApprovalGate, DEFAULT_APPROVAL_TIMEOUT, GateOutcome};
pub use compensation::CompensationManager;
pub use coordinator::{CoordinatorConfig, SagaCoordinator};
pub use error::{CompensationError, SagaError};
pub use scenario::{ScenarioParseError, ScenarioVariant};
pub use services::{
    AccountService, InMemoryAccountService, InMemoryLedgerService, InMemoryNotificationService,
    LedgerService, NotificationService,
};
pub use state::{StepName, TransferState};
pub use status::{StatusProjector, StatusSubscription, TransferStatus};
pub use transfer::{DepositReceipt, TransferOutput, TransferRequest};
