//! Demo scenario variants for exercising the saga.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Behavior variants a transfer saga can be run under.
///
/// The set is closed on purpose: every consumer matches on it
/// exhaustively, so adding a variant forces each dispatch site to decide
/// what the new behavior means for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioVariant {
    /// Straight-through transfer with no injected behavior.
    Normal,

    /// Parks the saga on the approval gate before withdrawing.
    RequiresApproval,

    /// Panics between withdraw and deposit to exercise crash handling.
    SimulatedBug,

    /// The ledger rejects withdrawals with retryable errors for a while.
    SimulatedApiDowntime,

    /// The deposit account does not exist; the ledger rejects it outright.
    SimulatedInvalidAccount,

    /// Tags every executed step on the runtime for observability.
    AdvancedVisibility,
}

impl ScenarioVariant {
    /// All variants, in declaration order.
    pub const ALL: [ScenarioVariant; 6] = [
        ScenarioVariant::Normal,
        ScenarioVariant::RequiresApproval,
        ScenarioVariant::SimulatedBug,
        ScenarioVariant::SimulatedApiDowntime,
        ScenarioVariant::SimulatedInvalidAccount,
        ScenarioVariant::AdvancedVisibility,
    ];

    /// Returns true if the saga must wait for approval before withdrawing.
    pub fn requires_approval(&self) -> bool {
        match self {
            ScenarioVariant::RequiresApproval => true,
            ScenarioVariant::Normal
            | ScenarioVariant::SimulatedBug
            | ScenarioVariant::SimulatedApiDowntime
            | ScenarioVariant::SimulatedInvalidAccount
            | ScenarioVariant::AdvancedVisibility => false,
        }
    }

    /// Returns true if the saga panics between withdraw and deposit.
    pub fn injects_bug(&self) -> bool {
        match self {
            ScenarioVariant::SimulatedBug => true,
            ScenarioVariant::Normal
            | ScenarioVariant::RequiresApproval
            | ScenarioVariant::SimulatedApiDowntime
            | ScenarioVariant::SimulatedInvalidAccount
            | ScenarioVariant::AdvancedVisibility => false,
        }
    }

    /// Returns true if each executed step is tagged on the runtime.
    pub fn tags_steps(&self) -> bool {
        match self {
            ScenarioVariant::AdvancedVisibility => true,
            ScenarioVariant::Normal
            | ScenarioVariant::RequiresApproval
            | ScenarioVariant::SimulatedBug
            | ScenarioVariant::SimulatedApiDowntime
            | ScenarioVariant::SimulatedInvalidAccount => false,
        }
    }

    /// Returns the scenario name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioVariant::Normal => "normal",
            ScenarioVariant::RequiresApproval => "requires_approval",
            ScenarioVariant::SimulatedBug => "simulated_bug",
            ScenarioVariant::SimulatedApiDowntime => "simulated_api_downtime",
            ScenarioVariant::SimulatedInvalidAccount => "simulated_invalid_account",
            ScenarioVariant::AdvancedVisibility => "advanced_visibility",
        }
    }
}

impl std::fmt::Display for ScenarioVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown scenario name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scenario '{0}'")]
pub struct ScenarioParseError(pub String);

impl FromStr for ScenarioVariant {
    type Err = ScenarioParseError;

    /// Parses a scenario name. Case-insensitive; accepts `-` for `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "normal" => Ok(ScenarioVariant::Normal),
            "requires_approval" => Ok(ScenarioVariant::RequiresApproval),
            "simulated_bug" => Ok(ScenarioVariant::SimulatedBug),
            "simulated_api_downtime" => Ok(ScenarioVariant::SimulatedApiDowntime),
            "simulated_invalid_account" => Ok(ScenarioVariant::SimulatedInvalidAccount),
            "advanced_visibility" => Ok(ScenarioVariant::AdvancedVisibility),
            other => Err(ScenarioParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_names_round_trip() {
        for scenario in ScenarioVariant::ALL {
            let parsed: ScenarioVariant = scenario.as_str().parse().unwrap();
            assert_eq!(parsed, scenario);
        }
    }

    #[test]
    fn test_parse_accepts_kebab_and_mixed_case() {
        let parsed: ScenarioVariant = "Simulated-API-Downtime".parse().unwrap();
        assert_eq!(parsed, ScenarioVariant::SimulatedApiDowntime);

        let parsed: ScenarioVariant = "  requires_approval ".parse().unwrap();
        assert_eq!(parsed, ScenarioVariant::RequiresApproval);
    }

    #[test]
    fn test_parse_unknown_name_fails() {
        let err = "chaos_monkey".parse::<ScenarioVariant>().unwrap_err();
        assert_eq!(err, ScenarioParseError("chaos_monkey".to_string()));
        assert_eq!(err.to_string(), "unknown scenario 'chaos_monkey'");
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&ScenarioVariant::SimulatedInvalidAccount).unwrap();
        assert_eq!(json, "\"simulated_invalid_account\"");
    }

    #[test]
    fn test_only_requires_approval_waits() {
        for scenario in ScenarioVariant::ALL {
            assert_eq!(
                scenario.requires_approval(),
                scenario == ScenarioVariant::RequiresApproval
            );
        }
    }

    #[test]
    fn test_only_simulated_bug_panics() {
        for scenario in ScenarioVariant::ALL {
            assert_eq!(scenario.injects_bug(), scenario == ScenarioVariant::SimulatedBug);
        }
    }

    #[test]
    fn test_only_advanced_visibility_tags() {
        for scenario in ScenarioVariant::ALL {
            assert_eq!(
                scenario.tags_steps(),
                scenario == ScenarioVariant::AdvancedVisibility
            );
        }
    }
}
