//! Worker configuration loaded from environment variables.

use std::time::Duration;

use saga::ScenarioVariant;

/// Demo worker configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SCENARIO`: scenario to run (default: `"normal"`)
/// - `AMOUNT_CENTS`: transfer amount in cents (default: `10000`)
/// - `FROM_ACCOUNT`: source account (default: `"checking-001"`)
/// - `TO_ACCOUNT`: target account (default: `"savings-002"`)
/// - `APPROVAL_TIMEOUT_SECS`: approval deadline (default: `30`)
/// - `APPROVE_AFTER_SECS`: seconds until the demo auto-approves a
///   waiting transfer; a non-numeric value disables it (default: `5`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub scenario: ScenarioVariant,
    pub amount_cents: i64,
    pub from_account: String,
    pub to_account: String,
    pub approval_timeout_secs: u64,
    pub approve_after_secs: Option<u64>,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            scenario: std::env::var("SCENARIO")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(ScenarioVariant::Normal),
            amount_cents: std::env::var("AMOUNT_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            from_account: std::env::var("FROM_ACCOUNT")
                .unwrap_or_else(|_| "checking-001".to_string()),
            to_account: std::env::var("TO_ACCOUNT").unwrap_or_else(|_| "savings-002".to_string()),
            approval_timeout_secs: std::env::var("APPROVAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            approve_after_secs: match std::env::var("APPROVE_AFTER_SECS") {
                Ok(value) => value.parse().ok(),
                Err(_) => Some(5),
            },
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Returns the approval deadline as a duration.
    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario: ScenarioVariant::Normal,
            amount_cents: 10_000,
            from_account: "checking-001".to_string(),
            to_account: "savings-002".to_string(),
            approval_timeout_secs: 30,
            approve_after_secs: Some(5),
            log_level: "info".to_string(),
        }
    }
}
