//! Durable execution primitives for the transfer saga.
//!
//! The [`SagaRuntime`] trait is the seam between orchestration logic and
//! the host that provides durable timers, signal delivery, and recorded
//! side effects. [`LocalRuntime`] is the in-process implementation used by
//! tests and the demo worker; a production host would implement the same
//! trait on top of its own persistence.
//!
//! Step invocations with retry semantics live in [`SagaRuntimeExt`], built
//! from the [`RetryPolicy`] in this crate.

pub mod host;
pub mod local;
pub mod retry;
pub mod step;

pub use host::{
    InvokeError, InvokeOptions, SagaRuntime, SagaRuntimeExt, SignalOutcome, SleepOutcome,
};
pub use local::LocalRuntime;
pub use retry::{RetryDecision, RetryPolicy};
pub use step::StepError;
