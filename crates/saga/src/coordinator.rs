//! Saga coordinator for orchestrating money transfers.

use std::time::Duration;

use common::{IdempotencyKey, TransferId};
use runtime::{InvokeError, InvokeOptions, RetryPolicy, SagaRuntime, SagaRuntimeExt, SleepOutcome};

use crate::approval::{ApprovalGate, DEFAULT_APPROVAL_TIMEOUT, GateOutcome};
use crate::compensation::CompensationManager;
use crate::error::{Result, SagaError};
use crate::scenario::ScenarioVariant;
use crate::services::{AccountService, LedgerService, NotificationService};
use crate::state::{SagaState, StepName, TransferState};
use crate::status::{StatusProjector, StatusSubscription, TransferStatus};
use crate::transfer::{TransferOutput, TransferRequest};

/// Tuning knobs for a transfer saga.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a transfer waits on the approval gate.
    pub approval_timeout: Duration,

    /// Schedule-to-close budget for the committal steps, measured per
    /// step across all of its retries. None retries without bound.
    pub step_deadline: Option<Duration>,

    /// Schedule-to-close budget for the notify step. Notify failures
    /// never fail the saga, so this only bounds how long it retries.
    pub notify_deadline: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            approval_timeout: DEFAULT_APPROVAL_TIMEOUT,
            step_deadline: None,
            notify_deadline: Some(Duration::from_secs(30)),
        }
    }
}

/// Orchestrates one money transfer saga.
///
/// The coordinator drives validate → (approval) → withdraw → deposit →
/// notify against injected collaborators, retries each step through the
/// runtime, and compensates a committed withdraw when the deposit cannot
/// complete. One coordinator runs exactly one transfer: [`run`] consumes
/// it, and dropping it closes the status channel.
///
/// [`run`]: SagaCoordinator::run
pub struct SagaCoordinator<R, A, L, N>
where
    R: SagaRuntime,
    A: AccountService,
    L: LedgerService,
    N: NotificationService,
{
    runtime: R,
    accounts: A,
    ledger: L,
    notifications: N,
    config: CoordinatorConfig,
    status: StatusProjector,
}

/// Maps a generic step invocation error onto the saga error taxonomy.
fn step_failure(step: StepName, error: InvokeError) -> SagaError {
    match error {
        InvokeError::Failed(source) => SagaError::StepFailed { step, source },
        InvokeError::Exhausted { attempts } => SagaError::StepExhausted { step, attempts },
        InvokeError::Cancelled => SagaError::Cancelled { step },
    }
}

impl<R, A, L, N> SagaCoordinator<R, A, L, N>
where
    R: SagaRuntime,
    A: AccountService,
    L: LedgerService,
    N: NotificationService,
{
    /// Creates a coordinator with default configuration.
    pub fn new(runtime: R, accounts: A, ledger: L, notifications: N) -> Self {
        Self::with_config(runtime, accounts, ledger, notifications, CoordinatorConfig::default())
    }

    /// Creates a coordinator with explicit configuration.
    pub fn with_config(
        runtime: R,
        accounts: A,
        ledger: L,
        notifications: N,
        config: CoordinatorConfig,
    ) -> Self {
        let initial = TransferStatus {
            progress_percentage: 0,
            transfer_state: TransferState::Running,
            charge_id: None,
            approval_timeout_secs: config.approval_timeout.as_secs(),
        };
        Self {
            runtime,
            accounts,
            ledger,
            notifications,
            config,
            status: StatusProjector::new(initial),
        }
    }

    /// Returns a new subscription to this transfer's status snapshots.
    pub fn status(&self) -> StatusSubscription {
        self.status.subscribe()
    }

    /// Runs the transfer saga to completion.
    ///
    /// Consumes the coordinator; subscribers observe the terminal
    /// snapshot and then see their channel close.
    #[tracing::instrument(
        skip(self, request, scenario),
        fields(%scenario, amount = %request.amount)
    )]
    pub async fn run(
        self,
        request: TransferRequest,
        scenario: ScenarioVariant,
    ) -> Result<TransferOutput> {
        metrics::counter!("transfer_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        // Both ids are recorded on the runtime so a replayed execution
        // reuses them instead of minting new ones.
        let transfer_id = TransferId::from_uuid(self.runtime.record_uuid());
        let key = IdempotencyKey::from_uuid(self.runtime.record_uuid());
        let mut saga = SagaState::new();

        tracing::info!(
            %transfer_id,
            from = %request.from_account,
            to = %request.to_account,
            started_at = %self.runtime.now(),
            "transfer saga started"
        );

        // 1. Validate the request
        self.enter_step(&mut saga, StepName::Validate, scenario).await;
        let validated = self
            .runtime
            .invoke_step(&self.step_options(), || self.accounts.validate(&request))
            .await;
        if let Err(error) = validated {
            let failure = match error {
                InvokeError::Failed(source) => SagaError::ValidationFailed { source },
                other => step_failure(StepName::Validate, other),
            };
            return self.fail(saga, saga_start, failure);
        }

        if let Err(failure) = self.pace(&saga, Duration::from_secs(1)).await {
            return self.fail(saga, saga_start, failure);
        }
        saga.progress = 25;
        self.publish(&saga);

        // 2. Park on the approval gate when the scenario calls for it
        if scenario.requires_approval() {
            self.enter_step(&mut saga, StepName::AwaitApproval, scenario).await;
            saga.progress = 30;
            saga.state = TransferState::Waiting;
            self.publish(&saga);

            let gate = ApprovalGate::new(self.config.approval_timeout);
            match gate.wait(&self.runtime).await {
                GateOutcome::Approved => {
                    saga.approved = true;
                    saga.state = TransferState::Running;
                    self.publish(&saga);
                    tracing::info!(%transfer_id, "transfer approved");
                }
                GateOutcome::TimedOut => {
                    let timeout_secs = gate.timeout().as_secs();
                    return self.fail(saga, saga_start, SagaError::ApprovalTimeout { timeout_secs });
                }
                GateOutcome::Cancelled => {
                    let failure = SagaError::Cancelled {
                        step: StepName::AwaitApproval,
                    };
                    return self.fail(saga, saga_start, failure);
                }
            }
        }

        // 3. Withdraw from the source account
        self.enter_step(&mut saga, StepName::Withdraw, scenario).await;
        let withdrawn = self
            .runtime
            .invoke_step(&self.step_options(), || {
                self.ledger.withdraw(&key, &request.from_account, request.amount)
            })
            .await;
        if let Err(error) = withdrawn {
            // Nothing has committed yet, so there is nothing to undo.
            return self.fail(saga, saga_start, step_failure(StepName::Withdraw, error));
        }

        // The withdraw is committed: every abort between here and the
        // deposit commit must return the funds.
        if let Err(failure) = self.pace(&saga, Duration::from_secs(3)).await {
            self.compensate(&mut saga, &key, &request, scenario).await;
            return self.fail(saga, saga_start, failure);
        }
        saga.progress = 50;
        self.publish(&saga);

        if scenario.injects_bug() {
            // Dies with the withdraw committed and the deposit not yet
            // started, leaving the saga open for the host to recover.
            panic!("simulated bug between withdraw and deposit");
        }

        // 4. Deposit into the target account
        self.enter_step(&mut saga, StepName::Deposit, scenario).await;
        let deposited = self
            .runtime
            .invoke_step(&self.step_options(), || {
                self.ledger.deposit(&key, &request.to_account, request.amount)
            })
            .await;
        let receipt = match deposited {
            Ok(receipt) => receipt,
            Err(error) => {
                let failure = match error {
                    InvokeError::Failed(source) => SagaError::DepositFailed { source },
                    other => step_failure(StepName::Deposit, other),
                };
                self.compensate(&mut saga, &key, &request, scenario).await;
                return self.fail(saga, saga_start, failure);
            }
        };
        saga.charge_id = Some(receipt.charge_id.clone());

        // The transfer is final once the deposit commits; cancellation
        // past this point is ignored and the saga runs to completion.
        let _ = self.pace(&saga, Duration::from_secs(1)).await;
        saga.progress = 75;
        self.publish(&saga);

        // 5. Notify the customer. Failure here degrades the result but
        // never fails the transfer.
        self.enter_step(&mut saga, StepName::Notify, scenario).await;
        let notified = self
            .runtime
            .invoke_step(&self.notify_options(), || self.notifications.notify(&request))
            .await;
        let notification_delivered = match notified {
            Ok(()) => true,
            Err(error) => {
                metrics::counter!("transfer_notify_degraded_total").increment(1);
                tracing::warn!(
                    %transfer_id,
                    error = %error,
                    "confirmation not delivered, transfer still completed"
                );
                false
            }
        };

        let _ = self.pace(&saga, Duration::from_secs(1)).await;
        saga.progress = 100;
        saga.state = TransferState::Finished;
        self.publish(&saga);

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("transfer_duration_seconds").record(duration);
        metrics::counter!("transfer_completed").increment(1);
        tracing::info!(
            %transfer_id,
            charge_id = %receipt.charge_id,
            approved = saga.approved,
            notification_delivered,
            duration,
            "transfer completed"
        );

        Ok(TransferOutput {
            charge_id: receipt.charge_id,
            notification_delivered,
        })
    }

    /// Marks a step current and tags it on the runtime when the scenario
    /// asks for step-level visibility.
    async fn enter_step(&self, saga: &mut SagaState, step: StepName, scenario: ScenarioVariant) {
        saga.current_step = step;
        tracing::info!(step = %step, progress = saga.progress, "saga step started");
        if scenario.tags_steps() {
            self.runtime.tag_step(step.as_str()).await;
        }
    }

    /// Sleeps between steps so the progress feed is followable.
    async fn pace(&self, saga: &SagaState, delay: Duration) -> Result<()> {
        match self.runtime.sleep(delay).await {
            SleepOutcome::Elapsed => Ok(()),
            SleepOutcome::Cancelled => Err(SagaError::Cancelled {
                step: saga.current_step,
            }),
        }
    }

    /// Returns the committed withdraw after a failure past the commit.
    async fn compensate(
        &self,
        saga: &mut SagaState,
        key: &IdempotencyKey,
        request: &TransferRequest,
        scenario: ScenarioVariant,
    ) {
        self.enter_step(saga, StepName::Compensate, scenario).await;
        self.publish(saga);

        // The caller reports the failure that got us here; a failed undo
        // is logged and counted by the manager and not retried.
        let manager = CompensationManager::new(&self.ledger);
        let _ = manager
            .undo_withdraw(key, &request.from_account, request.amount)
            .await;
    }

    /// Publishes the terminal failed snapshot and records the failure.
    fn fail(
        &self,
        mut saga: SagaState,
        saga_start: std::time::Instant,
        error: SagaError,
    ) -> Result<TransferOutput> {
        saga.state = TransferState::Failed;
        self.publish(&saga);

        metrics::histogram!("transfer_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("transfer_failed").increment(1);
        tracing::warn!(
            step = %saga.current_step,
            kind = error.kind(),
            error = %error,
            "transfer failed"
        );
        Err(error)
    }

    fn publish(&self, saga: &SagaState) {
        self.status
            .publish(saga.snapshot(self.config.approval_timeout.as_secs()));
    }

    fn step_options(&self) -> InvokeOptions {
        InvokeOptions {
            policy: RetryPolicy::default(),
            schedule_to_close: self.config.step_deadline,
        }
    }

    fn notify_options(&self) -> InvokeOptions {
        InvokeOptions {
            policy: RetryPolicy::default(),
            schedule_to_close: self.config.notify_deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use runtime::LocalRuntime;

    use crate::services::{
        InMemoryAccountService, InMemoryLedgerService, InMemoryNotificationService,
    };

    fn setup() -> (
        SagaCoordinator<
            LocalRuntime,
            InMemoryAccountService,
            InMemoryLedgerService,
            InMemoryNotificationService,
        >,
        LocalRuntime,
        InMemoryLedgerService,
        InMemoryNotificationService,
    ) {
        let runtime = LocalRuntime::new();
        let accounts = InMemoryAccountService::new();
        let ledger = InMemoryLedgerService::new();
        let notifications = InMemoryNotificationService::new();

        let coordinator = SagaCoordinator::new(
            runtime.clone(),
            accounts,
            ledger.clone(),
            notifications.clone(),
        );

        (coordinator, runtime, ledger, notifications)
    }

    fn request() -> TransferRequest {
        TransferRequest::new(Money::from_cents(10_000), "checking-001", "savings-002")
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path() {
        let (coordinator, runtime, ledger, notifications) = setup();

        let output = coordinator
            .run(request(), ScenarioVariant::Normal)
            .await
            .unwrap();

        assert_eq!(output.charge_id, "CHG-0001");
        assert!(output.notification_delivered);
        assert_eq!(ledger.withdraw_count(), 1);
        assert_eq!(ledger.deposit_count(), 1);
        assert_eq!(ledger.undo_count(), 0);
        assert_eq!(notifications.notification_count(), 1);
        // Transfer id and idempotency key are recorded side effects.
        assert_eq!(runtime.recorded_uuids().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_failure_is_terminal() {
        let (coordinator, _runtime, ledger, notifications) = setup();

        let result = coordinator
            .run(
                TransferRequest::new(Money::zero(), "checking-001", "savings-002"),
                ScenarioVariant::Normal,
            )
            .await;

        match result {
            Err(SagaError::ValidationFailed { source }) => {
                assert_eq!(source.kind, "invalid_amount");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(ledger.withdraw_count(), 0);
        assert_eq!(notifications.notification_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_snapshot_outlives_the_coordinator() {
        let (coordinator, _runtime, _ledger, _notifications) = setup();
        let subscription = coordinator.status();

        coordinator
            .run(request(), ScenarioVariant::Normal)
            .await
            .unwrap();

        let last = subscription.snapshot();
        assert_eq!(last.progress_percentage, 100);
        assert_eq!(last.transfer_state, TransferState::Finished);
        assert_eq!(last.charge_id.as_deref(), Some("CHG-0001"));
    }
}
