// ============================================================================
// Engine Configuration - AlphaCards Betting Engine
// ============================================================================
//
// Policy knobs are process-wide and read once at startup. Every card takes a
// snapshot of the config at creation time, so changing an env var and
// restarting never rewrites the rules of a market already in flight.
//
// ============================================================================

use serde::{Deserialize, Serialize};

/// Default platform fee taken from every stake (2.5%)
pub const DEFAULT_FEE_RATE: f64 = 0.025;

/// Default bond required to propose a resolution (in TAO)
pub const DEFAULT_RESOLUTION_BOND: f64 = 10.0;

/// Default dispute window after a proposal (24h)
pub const DEFAULT_DISPUTE_PERIOD_SECS: u64 = 86_400;

/// Default voting window after a dispute (24h)
pub const DEFAULT_VOTING_PERIOD_SECS: u64 = 86_400;

/// Default balance credited to a freshly seen account
pub const DEFAULT_STARTING_BALANCE: f64 = 1_000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Fraction of every stake kept as platform fee (0.025 = 2.5%)
    pub platform_fee_rate: f64,
    /// Bond escrowed by an outcome proposer
    pub resolution_bond: f64,
    /// Seconds after a proposal during which anyone may dispute it
    pub dispute_period_secs: u64,
    /// Seconds after a dispute during which stakers may vote
    pub voting_period_secs: u64,
    /// Balance given to new ledger accounts
    pub starting_balance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            platform_fee_rate: DEFAULT_FEE_RATE,
            resolution_bond: DEFAULT_RESOLUTION_BOND,
            dispute_period_secs: DEFAULT_DISPUTE_PERIOD_SECS,
            voting_period_secs: DEFAULT_VOTING_PERIOD_SECS,
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            platform_fee_rate: env_f64("PLATFORM_FEE_RATE", DEFAULT_FEE_RATE),
            resolution_bond: env_f64("RESOLUTION_BOND", DEFAULT_RESOLUTION_BOND),
            dispute_period_secs: env_u64("DISPUTE_PERIOD_SECS", DEFAULT_DISPUTE_PERIOD_SECS),
            voting_period_secs: env_u64("VOTING_PERIOD_SECS", DEFAULT_VOTING_PERIOD_SECS),
            starting_balance: env_f64("STARTING_BALANCE", DEFAULT_STARTING_BALANCE),
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.platform_fee_rate, 0.025);
        assert_eq!(config.resolution_bond, 10.0);
        assert_eq!(config.dispute_period_secs, 86_400);
        assert_eq!(config.voting_period_secs, 86_400);
    }

    #[test]
    fn test_env_fallback_on_garbage() {
        std::env::set_var("ALPHACARDS_TEST_F64", "not-a-number");
        assert_eq!(env_f64("ALPHACARDS_TEST_F64", 0.5), 0.5);
        std::env::remove_var("ALPHACARDS_TEST_F64");
    }
}
