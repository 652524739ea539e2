//! Ledger service handling the money movement steps.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AccountId, IdempotencyKey, Money};
use runtime::StepError;

use crate::transfer::DepositReceipt;

/// Trait for the ledger operations a transfer saga invokes.
///
/// Every operation deduplicates on its idempotency key: a retried call
/// with the same key must not move money twice, and a replayed deposit
/// must return the original charge id.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Debits the amount from the account.
    async fn withdraw(
        &self,
        key: &IdempotencyKey,
        account: &AccountId,
        amount: Money,
    ) -> Result<(), StepError>;

    /// Credits the amount to the account and returns the charge receipt.
    async fn deposit(
        &self,
        key: &IdempotencyKey,
        account: &AccountId,
        amount: Money,
    ) -> Result<DepositReceipt, StepError>;

    /// Returns a previously withdrawn amount to the account.
    async fn undo_withdraw(
        &self,
        key: &IdempotencyKey,
        account: &AccountId,
        amount: Money,
    ) -> Result<(), StepError>;
}

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    balances: HashMap<AccountId, Money>,
    withdrawals: HashSet<IdempotencyKey>,
    deposits: HashMap<IdempotencyKey, String>,
    undos: HashSet<IdempotencyKey>,
    next_charge: u32,
    withdraw_calls: u32,
    deposit_calls: u32,
    undo_calls: u32,
    withdraw_outage_remaining: u32,
    deposit_invalid_account: bool,
    fail_on_undo: bool,
}

/// In-memory ledger for testing.
///
/// Balances start at zero and may go negative; tests assert deltas, not
/// absolute balances. Charge ids are sequential (`CHG-0001`, ...).
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerService {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

impl InMemoryLedgerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `calls` withdraw calls fail with a retryable
    /// error. Pass `u32::MAX` for an outage that never ends.
    pub fn set_withdraw_outage(&self, calls: u32) {
        self.state.write().unwrap().withdraw_outage_remaining = calls;
    }

    /// Makes deposits fail as if the target account did not exist.
    pub fn set_deposit_invalid_account(&self, invalid: bool) {
        self.state.write().unwrap().deposit_invalid_account = invalid;
    }

    /// Makes undo_withdraw fail.
    pub fn set_fail_on_undo(&self, fail: bool) {
        self.state.write().unwrap().fail_on_undo = fail;
    }

    /// Returns the number of withdraw calls, including failed ones.
    pub fn withdraw_count(&self) -> u32 {
        self.state.read().unwrap().withdraw_calls
    }

    /// Returns the number of deposit calls, including failed ones.
    pub fn deposit_count(&self) -> u32 {
        self.state.read().unwrap().deposit_calls
    }

    /// Returns the number of undo_withdraw calls, including failed ones.
    pub fn undo_count(&self) -> u32 {
        self.state.read().unwrap().undo_calls
    }

    /// Returns the current balance of an account (zero if untouched).
    pub fn balance_of(&self, account: &AccountId) -> Money {
        self.state
            .read()
            .unwrap()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerService for InMemoryLedgerService {
    async fn withdraw(
        &self,
        key: &IdempotencyKey,
        account: &AccountId,
        amount: Money,
    ) -> Result<(), StepError> {
        let mut state = self.state.write().unwrap();
        state.withdraw_calls += 1;

        if state.withdrawals.contains(key) {
            // Same key, already booked: the retry is a no-op.
            return Ok(());
        }

        if state.withdraw_outage_remaining > 0 {
            state.withdraw_outage_remaining = state.withdraw_outage_remaining.saturating_sub(1);
            return Err(StepError::retryable(
                "service_unavailable",
                "ledger temporarily unavailable",
            ));
        }

        let balance = state.balances.entry(account.clone()).or_default();
        *balance -= amount;
        state.withdrawals.insert(key.clone());
        Ok(())
    }

    async fn deposit(
        &self,
        key: &IdempotencyKey,
        account: &AccountId,
        amount: Money,
    ) -> Result<DepositReceipt, StepError> {
        let mut state = self.state.write().unwrap();
        state.deposit_calls += 1;

        if let Some(charge_id) = state.deposits.get(key) {
            // Replayed deposit returns the original charge.
            return Ok(DepositReceipt {
                charge_id: charge_id.clone(),
            });
        }

        if state.deposit_invalid_account {
            return Err(StepError::non_retryable(
                "invalid_account",
                format!("account '{account}' does not exist"),
            ));
        }

        state.next_charge += 1;
        let charge_id = format!("CHG-{:04}", state.next_charge);
        let balance = state.balances.entry(account.clone()).or_default();
        *balance += amount;
        state.deposits.insert(key.clone(), charge_id.clone());
        Ok(DepositReceipt { charge_id })
    }

    async fn undo_withdraw(
        &self,
        key: &IdempotencyKey,
        account: &AccountId,
        amount: Money,
    ) -> Result<(), StepError> {
        let mut state = self.state.write().unwrap();
        state.undo_calls += 1;

        if state.fail_on_undo {
            return Err(StepError::non_retryable(
                "undo_rejected",
                "ledger rejected the reversal",
            ));
        }

        if state.undos.contains(key) {
            return Ok(());
        }

        let balance = state.balances.entry(account.clone()).or_default();
        *balance += amount;
        state.undos.insert(key.clone());
        Ok(())
    }
}
