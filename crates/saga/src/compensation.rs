//! Compensation for committed withdrawals.

use common::{AccountId, IdempotencyKey, Money};

use crate::error::CompensationError;
use crate::services::LedgerService;

/// Suffix appended to the transfer's idempotency key for the undo.
const UNDO_SUFFIX: &str = "undo";

/// Reverses a committed withdraw when the saga cannot complete.
///
/// The undo runs exactly once per saga and is never retried. Its key is
/// derived deterministically from the transfer's own idempotency key, so
/// a replayed compensation deduplicates on the ledger the same way the
/// forward operations do.
pub struct CompensationManager<'a, L: LedgerService> {
    ledger: &'a L,
}

impl<'a, L: LedgerService> CompensationManager<'a, L> {
    /// Creates a manager borrowing the saga's ledger.
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Returns the withdrawn amount to the source account.
    ///
    /// A failure here is a reconciliation incident, not a saga error: it
    /// is logged and counted, and the caller keeps its primary error.
    #[tracing::instrument(skip_all, fields(%key, %account, %amount))]
    pub async fn undo_withdraw(
        &self,
        key: &IdempotencyKey,
        account: &AccountId,
        amount: Money,
    ) -> Result<(), CompensationError> {
        metrics::counter!("transfer_compensations_total").increment(1);
        let undo_key = key.derived(UNDO_SUFFIX);

        match self.ledger.undo_withdraw(&undo_key, account, amount).await {
            Ok(()) => {
                tracing::info!(undo_key = %undo_key, "withdraw compensated");
                Ok(())
            }
            Err(source) => {
                metrics::counter!("transfer_compensation_failures_total").increment(1);
                tracing::error!(
                    undo_key = %undo_key,
                    error = %source,
                    "compensation failed, funds need manual reconciliation"
                );
                Err(CompensationError { source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryLedgerService;

    #[tokio::test]
    async fn test_undo_returns_the_funds() {
        let ledger = InMemoryLedgerService::new();
        let key = IdempotencyKey::new("transfer-1");
        let account = AccountId::new("checking-001");
        let amount = Money::from_cents(10_000);

        ledger.withdraw(&key, &account, amount).await.unwrap();
        assert_eq!(ledger.balance_of(&account), Money::from_cents(-10_000));

        let manager = CompensationManager::new(&ledger);
        manager.undo_withdraw(&key, &account, amount).await.unwrap();

        assert_eq!(ledger.balance_of(&account), Money::zero());
        assert_eq!(ledger.undo_count(), 1);
    }

    #[tokio::test]
    async fn test_replayed_undo_deduplicates_on_the_derived_key() {
        let ledger = InMemoryLedgerService::new();
        let key = IdempotencyKey::new("transfer-1");
        let account = AccountId::new("checking-001");
        let amount = Money::from_cents(10_000);

        ledger.withdraw(&key, &account, amount).await.unwrap();

        let manager = CompensationManager::new(&ledger);
        manager.undo_withdraw(&key, &account, amount).await.unwrap();
        manager.undo_withdraw(&key, &account, amount).await.unwrap();

        // Same derived key both times, so the ledger credits only once.
        assert_eq!(ledger.balance_of(&account), Money::zero());
        assert_eq!(ledger.undo_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_undo_reports_a_compensation_error() {
        let ledger = InMemoryLedgerService::new();
        let key = IdempotencyKey::new("transfer-1");
        let account = AccountId::new("checking-001");
        let amount = Money::from_cents(10_000);

        ledger.withdraw(&key, &account, amount).await.unwrap();
        ledger.set_fail_on_undo(true);

        let manager = CompensationManager::new(&ledger);
        let err = manager.undo_withdraw(&key, &account, amount).await.unwrap_err();

        assert_eq!(err.source.kind, "undo_rejected");
        assert_eq!(ledger.balance_of(&account), Money::from_cents(-10_000));
    }
}
