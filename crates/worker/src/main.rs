//! Demo worker entry point: runs one transfer saga end to end.

mod config;

use std::time::Duration;

use common::Money;
use runtime::LocalRuntime;
use saga::{
    APPROVE_TRANSFER_SIGNAL, CoordinatorConfig, InMemoryAccountService, InMemoryLedgerService,
    InMemoryNotificationService, SagaCoordinator, ScenarioVariant, TransferRequest,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the collaborators for the chosen scenario
    let runtime = LocalRuntime::new();
    let accounts = InMemoryAccountService::new();
    let ledger = InMemoryLedgerService::new();
    let notifications = InMemoryNotificationService::new();

    match config.scenario {
        ScenarioVariant::SimulatedApiDowntime => ledger.set_withdraw_outage(4),
        ScenarioVariant::SimulatedInvalidAccount => ledger.set_deposit_invalid_account(true),
        ScenarioVariant::Normal
        | ScenarioVariant::RequiresApproval
        | ScenarioVariant::SimulatedBug
        | ScenarioVariant::AdvancedVisibility => {}
    }

    let coordinator = SagaCoordinator::with_config(
        runtime.clone(),
        accounts,
        ledger,
        notifications,
        CoordinatorConfig {
            approval_timeout: config.approval_timeout(),
            ..CoordinatorConfig::default()
        },
    );

    // 4. Follow the status feed in the background
    let mut status = coordinator.status();
    let status_task = tokio::spawn(async move {
        while status.changed().await {
            let snapshot = status.snapshot();
            tracing::info!(
                progress = snapshot.progress_percentage,
                state = %snapshot.transfer_state,
                charge_id = snapshot.charge_id.as_deref().unwrap_or("-"),
                "transfer status"
            );
            if snapshot.transfer_state.is_terminal() {
                break;
            }
        }
    });

    // 5. Auto-approve after a delay when the scenario waits for it
    if config.scenario.requires_approval()
        && let Some(secs) = config.approve_after_secs
    {
        let approver = runtime.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::info!("sending approval signal");
            approver.signal(APPROVE_TRANSFER_SIGNAL);
        });
    }

    // 6. Run the saga
    let request = TransferRequest::new(
        Money::from_cents(config.amount_cents),
        config.from_account.clone(),
        config.to_account.clone(),
    );
    tracing::info!(scenario = %config.scenario, amount = %request.amount, "starting transfer");

    let result = coordinator.run(request, config.scenario).await;
    let _ = status_task.await;

    tracing::debug!(metrics = %metrics_handle.render(), "prometheus snapshot");

    match result {
        Ok(output) => {
            tracing::info!(
                charge_id = %output.charge_id,
                notification_delivered = output.notification_delivered,
                "transfer finished"
            );
        }
        Err(error) => {
            tracing::error!(kind = error.kind(), error = %error, "transfer failed");
            std::process::exit(1);
        }
    }
}
