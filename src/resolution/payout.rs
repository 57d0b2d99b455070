// ============================================================================
// Payout Engine - AlphaCards Betting Engine
// ============================================================================
//
// Once a card is finalized, each winning staker redeems a proportional share
// of the pool frozen at finalize time:
//
//   payout = (user_stake_on_winner / total_stake_on_winner) * payout_pool
//
// The user's winning position is zeroed before the amount is reported, which
// makes redemption idempotent: the second call finds nothing and fails with
// NothingToRedeem. Losing stakes are never redeemable; their value is what
// the winners are splitting.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::store::{CardState, Outcome};
use crate::error::CardError;

/// Record of one executed redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemReceipt {
    pub card_id: u64,
    pub account: String,
    pub winning_outcome: Outcome,
    /// Fee-net stake the user held on the winning bucket
    pub stake_redeemed: f64,
    /// Value released to the user
    pub payout: f64,
    /// Pool remaining after this redemption
    pub remaining_liquidity: f64,
}

impl CardState {
    /// Redeem `account`'s winnings. The caller credits the returned payout
    /// to the user's balance as the last step, after this bookkeeping has
    /// committed.
    pub fn redeem(&mut self, account: &str) -> Result<RedeemReceipt, CardError> {
        if !self.card.resolved {
            return Err(CardError::NotResolved);
        }
        // resolved implies both of these are set
        let outcome = self.card.outcome.ok_or(CardError::NotResolved)?;
        let pool = self.payout_pool.ok_or(CardError::NotResolved)?;

        let bucket = outcome.bucket();
        let stake = self
            .stakes
            .get(account)
            .map(|position| position[bucket])
            .unwrap_or(0.0);
        if !(stake > 0.0) {
            return Err(CardError::NothingToRedeem);
        }

        let winning_total = self.totals.buckets[bucket];
        let payout = (stake / winning_total) * pool;

        // Zero the position first; the value transfer happens after this
        // state is committed.
        if let Some(position) = self.stakes.get_mut(account) {
            position[bucket] = 0.0;
        }
        self.totals.total_liquidity = (self.totals.total_liquidity - payout).max(0.0);

        info!(card_id = self.card.id, account, stake, payout, "winnings redeemed");

        Ok(RedeemReceipt {
            card_id: self.card.id,
            account: account.to_string(),
            winning_outcome: outcome,
            stake_redeemed: stake,
            payout,
            remaining_liquidity: self.totals.total_liquidity,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
