//! Published status snapshots for transfer observers.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::state::TransferState;

/// Point-in-time view of a transfer.
///
/// Snapshots are immutable once published; observers can never see a
/// half-updated status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStatus {
    /// Completed portion of the saga, 0..=100.
    pub progress_percentage: u8,
    /// Lifecycle state matching the snapshot.
    pub transfer_state: TransferState,
    /// Charge id, present once the deposit has committed.
    pub charge_id: Option<String>,
    /// Approval deadline the saga applies while waiting, in seconds.
    pub approval_timeout_secs: u64,
}

/// Single-writer publisher for [`TransferStatus`] snapshots.
///
/// Built on a watch channel: each publish atomically replaces the
/// snapshot, and readers always get the latest committed value without
/// ever blocking the writer.
#[derive(Debug)]
pub struct StatusProjector {
    tx: watch::Sender<TransferStatus>,
}

impl StatusProjector {
    /// Creates a projector seeded with the given snapshot.
    pub fn new(initial: TransferStatus) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    /// Publishes a new snapshot, replacing the previous one.
    pub fn publish(&self, status: TransferStatus) {
        self.tx.send_replace(status);
    }

    /// Creates a new independent subscription.
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the status channel.
///
/// Cheap to clone; every clone tracks its own notification position.
#[derive(Debug, Clone)]
pub struct StatusSubscription {
    rx: watch::Receiver<TransferStatus>,
}

impl StatusSubscription {
    /// Returns the latest published snapshot without blocking.
    pub fn snapshot(&self) -> TransferStatus {
        self.rx.borrow().clone()
    }

    /// Waits until a snapshot newer than the last seen one exists.
    ///
    /// Returns false once the saga has finished and dropped its
    /// projector; `snapshot` still serves the final value after that.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(progress: u8, state: TransferState) -> TransferStatus {
        TransferStatus {
            progress_percentage: progress,
            transfer_state: state,
            charge_id: None,
            approval_timeout_secs: 30,
        }
    }

    #[tokio::test]
    async fn test_snapshot_returns_latest_publish() {
        let projector = StatusProjector::new(status(0, TransferState::Running));
        let subscription = projector.subscribe();

        projector.publish(status(25, TransferState::Running));
        projector.publish(status(50, TransferState::Running));

        assert_eq!(subscription.snapshot().progress_percentage, 50);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_the_same_snapshot() {
        let projector = StatusProjector::new(status(0, TransferState::Running));
        let first = projector.subscribe();
        let second = projector.subscribe();

        projector.publish(status(75, TransferState::Running));

        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_wakes_on_publish() {
        let projector = StatusProjector::new(status(0, TransferState::Running));
        let mut subscription = projector.subscribe();

        let waiter = tokio::spawn(async move {
            assert!(subscription.changed().await);
            subscription.snapshot()
        });
        tokio::task::yield_now().await;

        projector.publish(status(100, TransferState::Finished));

        let seen = waiter.await.unwrap();
        assert_eq!(seen.progress_percentage, 100);
        assert_eq!(seen.transfer_state, TransferState::Finished);
    }

    #[tokio::test]
    async fn test_changed_returns_false_after_projector_drops() {
        let projector = StatusProjector::new(status(100, TransferState::Finished));
        let mut subscription = projector.subscribe();
        drop(projector);

        assert!(!subscription.changed().await);
        // The final snapshot remains readable.
        assert_eq!(subscription.snapshot().progress_percentage, 100);
    }

    #[tokio::test]
    async fn test_status_serialization() {
        let status = TransferStatus {
            progress_percentage: 50,
            transfer_state: TransferState::Waiting,
            charge_id: Some("CHG-0001".to_string()),
            approval_timeout_secs: 30,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"transfer_state\":\"waiting\""));
        assert!(json.contains("\"progress_percentage\":50"));

        let back: TransferStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
