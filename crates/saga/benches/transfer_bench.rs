use common::{AccountId, IdempotencyKey, Money};
use criterion::{Criterion, criterion_group, criterion_main};
use runtime::{LocalRuntime, RetryPolicy, StepError};
use saga::{
    InMemoryAccountService, InMemoryLedgerService, InMemoryNotificationService, LedgerService,
    SagaCoordinator, ScenarioVariant, TransferRequest,
};

fn make_request() -> TransferRequest {
    TransferRequest::new(Money::from_cents(10_000), "checking-001", "savings-002")
}

fn bench_happy_path_saga(c: &mut Criterion) {
    // Paused clock so the saga's pacing sleeps cost nothing.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    c.bench_function("transfer/happy_path_saga", |b| {
        b.iter(|| {
            rt.block_on(async {
                let coordinator = SagaCoordinator::new(
                    LocalRuntime::new(),
                    InMemoryAccountService::new(),
                    InMemoryLedgerService::new(),
                    InMemoryNotificationService::new(),
                );
                coordinator
                    .run(make_request(), ScenarioVariant::Normal)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_retry_decisions(c: &mut Criterion) {
    let policy = RetryPolicy::default();
    let error = StepError::retryable("service_unavailable", "ledger temporarily unavailable");

    c.bench_function("transfer/retry_decide_8_attempts", |b| {
        b.iter(|| {
            for attempt in 1..=8 {
                std::hint::black_box(policy.decide(attempt, &error));
            }
        });
    });
}

fn bench_ledger_withdraw_deposit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("transfer/ledger_withdraw_deposit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InMemoryLedgerService::new();
                let key = IdempotencyKey::new("bench-transfer");
                let from = AccountId::new("checking-001");
                let to = AccountId::new("savings-002");
                let amount = Money::from_cents(10_000);

                ledger.withdraw(&key, &from, amount).await.unwrap();
                ledger.deposit(&key, &to, amount).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_happy_path_saga,
    bench_retry_decisions,
    bench_ledger_withdraw_deposit,
);
criterion_main!(benches);
