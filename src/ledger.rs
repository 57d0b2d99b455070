// ============================================================================
// Account Ledger - AlphaCards Betting Engine
// ============================================================================
//
// Process-internal balances backing stakes, bonds and payouts. Funds leave an
// account when it stakes or posts a bond, sit escrowed inside the card state,
// and come back through redemption or bond settlement. Credits are always the
// last step of an engine transaction: bookkeeping commits first, then money
// moves.
//
// Accounts are created on first touch with the configured starting balance,
// so the dashboard can onboard a wallet with a single balance read.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::CardError;

/// Why value moved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    /// New account funded with the starting balance
    Seed,
    /// Account-to-account transfer
    Transfer,
    /// Stake escrowed into a card
    Stake,
    /// Resolution or dispute bond escrowed
    Bond,
    /// Bond returned or awarded at finalize
    BondSettlement,
    /// Winnings released by redemption
    Payout,
}

/// One ledger movement. `from`/`to` are None when the counterparty is the
/// engine's escrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTx {
    pub id: String,
    pub kind: TxType,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: f64,
    pub timestamp: u64,
}

#[derive(Debug)]
pub struct Ledger {
    accounts: HashMap<String, f64>,
    transactions: Vec<LedgerTx>,
    starting_balance: f64,
}

impl Ledger {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            accounts: HashMap::new(),
            transactions: Vec::new(),
            starting_balance,
        }
    }

    /// Balance for `account`, seeding it with the starting balance on first
    /// touch.
    pub fn balance_of(&mut self, account: &str) -> f64 {
        if !self.accounts.contains_key(account) {
            self.accounts.insert(account.to_string(), self.starting_balance);
            self.record(TxType::Seed, None, Some(account), self.starting_balance);
        }
        self.accounts[account]
    }

    /// Remove value from an account. Fails without mutating anything when
    /// funds are short.
    pub fn debit(&mut self, account: &str, amount: f64, kind: TxType) -> Result<String, CardError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(CardError::InsufficientBalance { available, required: amount });
        }
        *self.accounts.get_mut(account).unwrap() -= amount;
        Ok(self.record(kind, Some(account), None, amount))
    }

    /// Add value to an account. Cannot fail; used as the final step of
    /// payouts and bond settlements.
    pub fn credit(&mut self, account: &str, amount: f64, kind: TxType) -> String {
        self.balance_of(account);
        *self.accounts.get_mut(account).unwrap() += amount;
        self.record(kind, None, Some(account), amount)
    }

    pub fn transfer(&mut self, from: &str, to: &str, amount: f64) -> Result<String, CardError> {
        if !(amount > 0.0) {
            return Err(CardError::ZeroStake);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(CardError::InsufficientBalance { available, required: amount });
        }
        self.balance_of(to);
        *self.accounts.get_mut(from).unwrap() -= amount;
        *self.accounts.get_mut(to).unwrap() += amount;
        Ok(self.record(TxType::Transfer, Some(from), Some(to), amount))
    }

    pub fn recent_transactions(&self, limit: usize) -> Vec<LedgerTx> {
        self.transactions.iter().rev().take(limit).cloned().collect()
    }

    fn record(&mut self, kind: TxType, from: Option<&str>, to: Option<&str>, amount: f64) -> String {
        let id = format!("tx_{}", Uuid::new_v4().simple());
        self.transactions.push(LedgerTx {
            id: id.clone(),
            kind,
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            amount,
            timestamp: now(),
        });
        id
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounts_seed_on_first_touch() {
        let mut ledger = Ledger::new(1_000.0);
        assert_eq!(ledger.balance_of("alice"), 1_000.0);
        // Second read does not re-seed
        assert_eq!(ledger.balance_of("alice"), 1_000.0);
        assert_eq!(ledger.recent_transactions(10).len(), 1);
    }

    #[test]
    fn test_debit_and_credit() {
        let mut ledger = Ledger::new(100.0);
        ledger.debit("alice", 30.0, TxType::Stake).unwrap();
        assert_eq!(ledger.balance_of("alice"), 70.0);
        ledger.credit("alice", 45.0, TxType::Payout);
        assert_eq!(ledger.balance_of("alice"), 115.0);
    }

    #[test]
    fn test_overdraft_rejected_without_mutation() {
        let mut ledger = Ledger::new(10.0);
        let err = ledger.debit("alice", 10.5, TxType::Bond).unwrap_err();
        assert_eq!(err, CardError::InsufficientBalance { available: 10.0, required: 10.5 });
        assert_eq!(ledger.balance_of("alice"), 10.0);
    }

    #[test]
    fn test_transfer_conserves_value() {
        let mut ledger = Ledger::new(100.0);
        ledger.transfer("alice", "bob", 25.0).unwrap();
        assert_eq!(ledger.balance_of("alice"), 75.0);
        assert_eq!(ledger.balance_of("bob"), 125.0);

        assert_eq!(ledger.transfer("alice", "bob", 0.0).unwrap_err(), CardError::ZeroStake);
        assert!(matches!(
            ledger.transfer("alice", "bob", 1_000.0).unwrap_err(),
            CardError::InsufficientBalance { .. }
        ));
    }
}
