//! Shared types for the money transfer saga.
//!
//! This crate holds the identifier newtypes and the integer-cents money
//! type used across the workspace. Keeping them here prevents the saga,
//! runtime, and worker crates from depending on each other for basic
//! vocabulary types.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{AccountId, IdempotencyKey, TransferId};
