//! Account validation service.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use runtime::StepError;

use crate::transfer::TransferRequest;

/// Trait for pre-flight validation of a transfer.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Checks that the request is well-formed and the accounts usable.
    async fn validate(&self, request: &TransferRequest) -> Result<(), StepError>;
}

#[derive(Debug, Default)]
struct InMemoryAccountState {
    validations: u32,
    reject_transfers: bool,
}

/// In-memory account service for testing.
///
/// Accepts any positive transfer unless told to reject everything.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountService {
    state: Arc<RwLock<InMemoryAccountState>>,
}

impl InMemoryAccountService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to reject every transfer.
    pub fn set_reject_transfers(&self, reject: bool) {
        self.state.write().unwrap().reject_transfers = reject;
    }

    /// Returns the number of validation calls.
    pub fn validation_count(&self) -> u32 {
        self.state.read().unwrap().validations
    }
}

#[async_trait]
impl AccountService for InMemoryAccountService {
    async fn validate(&self, request: &TransferRequest) -> Result<(), StepError> {
        let mut state = self.state.write().unwrap();
        state.validations += 1;

        if state.reject_transfers {
            return Err(StepError::non_retryable(
                "account_frozen",
                format!("account '{}' is frozen", request.from_account),
            ));
        }

        if !request.amount.is_positive() {
            return Err(StepError::non_retryable(
                "invalid_amount",
                format!("transfer amount must be positive, got {}", request.amount),
            ));
        }

        Ok(())
    }
}
