//! Customer notification service.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use runtime::StepError;

use crate::transfer::TransferRequest;

/// Trait for sending the transfer confirmation.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends the confirmation for a completed transfer.
    async fn notify(&self, request: &TransferRequest) -> Result<(), StepError>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    notifications: u32,
    fail_on_notify: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to reject every notification.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the number of notify calls, including failed ones.
    pub fn notification_count(&self) -> u32 {
        self.state.read().unwrap().notifications
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn notify(&self, request: &TransferRequest) -> Result<(), StepError> {
        let mut state = self.state.write().unwrap();
        state.notifications += 1;

        if state.fail_on_notify {
            return Err(StepError::non_retryable(
                "notify_rejected",
                "notification gateway rejected the message",
            ));
        }

        tracing::debug!(
            from = %request.from_account,
            to = %request.to_account,
            "transfer confirmation sent"
        );
        Ok(())
    }
}
