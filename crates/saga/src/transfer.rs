//! Transfer request and result types.

use common::{AccountId, Money};
use serde::{Deserialize, Serialize};

/// Immutable input for one transfer saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Amount to move.
    pub amount: Money,
    /// Account the amount is withdrawn from.
    pub from_account: AccountId,
    /// Account the amount is deposited into.
    pub to_account: AccountId,
}

impl TransferRequest {
    /// Creates a new transfer request.
    pub fn new(
        amount: Money,
        from_account: impl Into<AccountId>,
        to_account: impl Into<AccountId>,
    ) -> Self {
        Self {
            amount,
            from_account: from_account.into(),
            to_account: to_account.into(),
        }
    }
}

/// Receipt returned by a successful deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Charge identifier assigned by the ledger.
    pub charge_id: String,
}

/// Terminal result of a completed transfer saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutput {
    /// Charge identifier from the deposit step.
    pub charge_id: String,
    /// False when the confirmation notification could not be delivered.
    /// The transfer itself still completed.
    pub notification_delivered: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_request_new() {
        let request = TransferRequest::new(Money::from_cents(2_500), "checking-001", "savings-002");

        assert_eq!(request.amount, Money::from_cents(2_500));
        assert_eq!(request.from_account.as_str(), "checking-001");
        assert_eq!(request.to_account.as_str(), "savings-002");
    }

    #[test]
    fn test_transfer_request_serialization() {
        let request = TransferRequest::new(Money::from_cents(100), "a", "b");

        let json = serde_json::to_string(&request).unwrap();
        let back: TransferRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(back, request);
    }

    #[test]
    fn test_transfer_output_serialization() {
        let output = TransferOutput {
            charge_id: "CHG-0001".to_string(),
            notification_delivered: false,
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"charge_id\":\"CHG-0001\""));
        assert!(json.contains("\"notification_delivered\":false"));
    }
}
