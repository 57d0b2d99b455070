// ============================================================================
// Stake Pool - AlphaCards Betting Engine
// ============================================================================
//
// Proportional share accounting. Every stake pays the platform fee up front;
// only the fee-net amount enters the user's position and the outcome bucket.
// `total_liquidity` therefore always equals the sum of the buckets and is an
// honest, currently-redeemable figure at any point in the card's life.
//
// Invariants, at all times:
//   - sum of user stakes on a bucket == that bucket's total
//   - total_liquidity == sum of buckets (until redemptions draw it down)
//
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::store::CardState;
use crate::error::CardError;

// ============================================================================
// STAKE TOTALS
// ============================================================================

/// Per-card aggregate stake figures. All amounts are fee-net absolute value,
/// never percentages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StakeTotals {
    /// Fee-net stake per outcome bucket
    pub buckets: Vec<f64>,
    /// Redeemable pool: sum of buckets, drawn down by payouts after resolve
    pub total_liquidity: f64,
    /// Platform fees accrued at stake time; not redeemable by stakers
    pub fees_collected: f64,
}

impl StakeTotals {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![0.0; bucket_count],
            total_liquidity: 0.0,
            fees_collected: 0.0,
        }
    }
}

/// What one accepted stake did to the books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeReceipt {
    pub card_id: u64,
    pub staker: String,
    pub outcome: usize,
    /// Amount the staker paid
    pub gross_amount: f64,
    /// Platform fee deducted
    pub fee: f64,
    /// Amount credited to the position and bucket
    pub net_amount: f64,
    /// Bucket total after this stake
    pub bucket_total: f64,
    /// Pool total after this stake
    pub total_liquidity: f64,
}

// ============================================================================
// STAKE OPERATIONS
// ============================================================================

impl CardState {
    /// Stake `amount` on `outcome`. Validates everything before touching any
    /// field, so a rejected stake leaves the card byte-for-byte unchanged.
    pub fn stake(
        &mut self,
        outcome: usize,
        amount: f64,
        staker: &str,
        now: u64,
    ) -> Result<StakeReceipt, CardError> {
        if !self.card.is_open(now) {
            return Err(CardError::CardClosed);
        }
        let option_count = self.card.kind.option_count();
        if outcome >= option_count {
            return Err(CardError::InvalidOutcome { index: outcome, option_count });
        }
        // Rejects zero, negatives and NaN in one comparison
        if !(amount > 0.0) {
            return Err(CardError::ZeroStake);
        }

        let fee = amount * self.card.config.platform_fee_rate;
        let net = amount - fee;

        let position = self
            .stakes
            .entry(staker.to_string())
            .or_insert_with(|| vec![0.0; option_count]);
        position[outcome] += net;
        self.totals.buckets[outcome] += net;
        self.totals.total_liquidity += net;
        self.totals.fees_collected += fee;

        info!(
            card_id = self.card.id,
            staker,
            outcome,
            gross = amount,
            net,
            fee,
            "stake accepted"
        );

        Ok(StakeReceipt {
            card_id: self.card.id,
            staker: staker.to_string(),
            outcome,
            gross_amount: amount,
            fee,
            net_amount: net,
            bucket_total: self.totals.buckets[outcome],
            total_liquidity: self.totals.total_liquidity,
        })
    }

    /// Per-outcome fee-net amounts for one user. Zeroes if they never staked.
    pub fn user_stake(&self, account: &str) -> Vec<f64> {
        self.stakes
            .get(account)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.card.kind.option_count()])
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::store::{Card, CardKind};
    use crate::config::EngineConfig;

    fn binary_state(deadline: u64) -> CardState {
        CardState::new(Card {
            id: 1,
            netuid: 1,
            kind: CardKind::Binary { threshold: 0.025 },
            deadline,
            creator: "creator".to_string(),
            resolved: false,
            outcome: None,
            creation_time: 0,
            config: EngineConfig::default(),
        })
    }

    #[test]
    fn test_stake_applies_fee() {
        let mut state = binary_state(86_400);

        // Scenario from the dashboard's reference flow: 10 on YES, 5 on NO
        // at a 2.5% fee.
        let receipt = state.stake(0, 10.0, "alice", 100).unwrap();
        assert_eq!(receipt.fee, 0.25);
        assert_eq!(receipt.net_amount, 9.75);

        state.stake(1, 5.0, "bob", 200).unwrap();

        assert_eq!(state.totals.buckets[0], 9.75);
        assert_eq!(state.totals.buckets[1], 4.875);
        assert_eq!(state.totals.total_liquidity, 14.625);
        assert_eq!(state.totals.fees_collected, 0.375);
    }

    #[test]
    fn test_user_totals_match_buckets() {
        let mut state = binary_state(86_400);
        state.stake(0, 10.0, "alice", 1).unwrap();
        state.stake(0, 4.0, "bob", 2).unwrap();
        state.stake(1, 6.0, "alice", 3).unwrap();

        for bucket in 0..2 {
            let user_sum: f64 = state.stakes.values().map(|s| s[bucket]).sum();
            assert!((user_sum - state.totals.buckets[bucket]).abs() < 1e-12);
        }
        let bucket_sum: f64 = state.totals.buckets.iter().sum();
        assert!((bucket_sum - state.totals.total_liquidity).abs() < 1e-12);
    }

    #[test]
    fn test_stake_after_deadline_rejected() {
        let mut state = binary_state(1_000);
        let err = state.stake(0, 10.0, "alice", 1_000).unwrap_err();
        assert_eq!(err, CardError::CardClosed);
        assert_eq!(state.totals.total_liquidity, 0.0);
    }

    #[test]
    fn test_stake_on_resolved_card_rejected() {
        let mut state = binary_state(86_400);
        state.card.resolved = true;
        assert_eq!(state.stake(0, 10.0, "alice", 1).unwrap_err(), CardError::CardClosed);
    }

    #[test]
    fn test_invalid_outcome_index() {
        let mut state = binary_state(86_400);
        let err = state.stake(2, 10.0, "alice", 1).unwrap_err();
        assert_eq!(err, CardError::InvalidOutcome { index: 2, option_count: 2 });
    }

    #[test]
    fn test_zero_and_negative_stake_rejected() {
        let mut state = binary_state(86_400);
        assert_eq!(state.stake(0, 0.0, "alice", 1).unwrap_err(), CardError::ZeroStake);
        assert_eq!(state.stake(0, -5.0, "alice", 1).unwrap_err(), CardError::ZeroStake);
        assert_eq!(state.stake(0, f64::NAN, "alice", 1).unwrap_err(), CardError::ZeroStake);
        // Failed validation left nothing behind
        assert!(state.stakes.is_empty());
    }

    #[test]
    fn test_user_stake_defaults_to_zero() {
        let state = binary_state(86_400);
        assert_eq!(state.user_stake("nobody"), vec![0.0, 0.0]);
    }

    #[test]
    fn test_liquidity_monotone_while_open() {
        let mut state = binary_state(86_400);
        let mut last = 0.0;
        for i in 1..=20u64 {
            state.stake((i % 2) as usize, i as f64, &format!("user{}", i % 5), i).unwrap();
            assert!(state.totals.total_liquidity > last);
            last = state.totals.total_liquidity;
        }
    }
}
