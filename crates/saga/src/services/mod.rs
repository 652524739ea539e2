//! External service traits and in-memory implementations for saga steps.

pub mod account;
pub mod ledger;
pub mod notification;

pub use account::{AccountService, InMemoryAccountService};
pub use ledger::{InMemoryLedgerService, LedgerService};
pub use notification::{InMemoryNotificationService, NotificationService};
