//! In-process saga runtime backed by tokio primitives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::host::{SagaRuntime, SignalOutcome, SleepOutcome};

struct SignalSlot {
    notify: Arc<Notify>,
    waiters: usize,
}

impl SignalSlot {
    fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            waiters: 0,
        }
    }
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, SignalSlot>,
    slept: Vec<Duration>,
    tags: Vec<String>,
    recorded_uuids: Vec<Uuid>,
    ignored_signals: u64,
}

/// In-process [`SagaRuntime`] for tests and the demo worker.
///
/// Timers go through `tokio::time`, so tests running under a paused clock
/// advance through sleeps instantly. A signal is delivered only to a
/// waiter currently parked on its name; anything else is counted and
/// dropped. Clones share state, which lets a test hold one handle while
/// the saga owns another.
///
/// This runtime provides no durability. Its `record_uuid` mints a fresh
/// value every call because there is no history to replay.
#[derive(Clone, Default)]
pub struct LocalRuntime {
    inner: Arc<Mutex<Inner>>,
    cancelled: Arc<AtomicBool>,
    cancel_notify: Arc<Notify>,
}

impl LocalRuntime {
    /// Creates a new runtime with no pending signals or cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a named signal to a currently parked waiter.
    ///
    /// Without a parked waiter the signal is dropped and counted, which
    /// is what makes out-of-band signals no-ops.
    pub fn signal(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        let delivered = match inner.slots.get(name) {
            Some(slot) if slot.waiters > 0 => {
                slot.notify.notify_one();
                true
            }
            _ => false,
        };
        if !delivered {
            inner.ignored_signals += 1;
            tracing::debug!(signal = name, "signal ignored, no active waiter");
        }
    }

    /// Requests cooperative cancellation.
    ///
    /// Parked sleeps and signal waits return `Cancelled`; later calls
    /// short-circuit before doing any work.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.cancel_notify.notify_waiters();
    }

    /// Returns the durations of all fully elapsed sleeps, in order.
    pub fn slept(&self) -> Vec<Duration> {
        self.inner.lock().unwrap().slept.clone()
    }

    /// Returns all recorded step labels, in order.
    pub fn tags(&self) -> Vec<String> {
        self.inner.lock().unwrap().tags.clone()
    }

    /// Returns how many signals were dropped for lack of a waiter.
    pub fn ignored_signals(&self) -> u64 {
        self.inner.lock().unwrap().ignored_signals
    }

    /// Returns all UUIDs handed out by `record_uuid`, in order.
    pub fn recorded_uuids(&self) -> Vec<Uuid> {
        self.inner.lock().unwrap().recorded_uuids.clone()
    }
}

#[async_trait]
impl SagaRuntime for LocalRuntime {
    async fn sleep(&self, duration: Duration) -> SleepOutcome {
        if self.cancellation_requested() {
            return SleepOutcome::Cancelled;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => {
                self.inner.lock().unwrap().slept.push(duration);
                SleepOutcome::Elapsed
            }
            _ = self.cancel_notify.notified() => SleepOutcome::Cancelled,
        }
    }

    async fn await_signal(&self, name: &str, timeout: Duration) -> SignalOutcome {
        if self.cancellation_requested() {
            return SignalOutcome::Cancelled;
        }

        let notify = {
            let mut inner = self.inner.lock().unwrap();
            let slot = inner
                .slots
                .entry(name.to_string())
                .or_insert_with(SignalSlot::new);
            slot.waiters += 1;
            slot.notify.clone()
        };

        let outcome = tokio::select! {
            _ = notify.notified() => SignalOutcome::Received,
            _ = tokio::time::sleep(timeout) => SignalOutcome::TimedOut,
            _ = self.cancel_notify.notified() => SignalOutcome::Cancelled,
        };

        // Dropping an idle slot discards any permit stored after the wait
        // ended, so a late signal cannot leak into the next wait.
        let mut inner = self.inner.lock().unwrap();
        let remove = if let Some(slot) = inner.slots.get_mut(name) {
            slot.waiters -= 1;
            slot.waiters == 0
        } else {
            false
        };
        if remove {
            inner.slots.remove(name);
        }

        outcome
    }

    fn record_uuid(&self) -> Uuid {
        let uuid = Uuid::new_v4();
        self.inner.lock().unwrap().recorded_uuids.push(uuid);
        uuid
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn tag_step(&self, label: &str) {
        self.inner.lock().unwrap().tags.push(label.to_string());
    }

    fn cancellation_requested(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
