// ============================================================================
// Card Store - AlphaCards Betting Engine
// ============================================================================
//
// Owns every card record. Cards live in an arena keyed by id; each entry sits
// behind its own mutex so operations on different cards never contend, while
// every state-mutating operation on one card runs in a per-card exclusive
// section. The outer map lock is held only to look entries up or insert.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::cards::stake::StakeTotals;
use crate::config::EngineConfig;
use crate::error::CardError;
use crate::resolution::coordinator::Proposal;

/// Highest subnet id a card may reference
pub const MAX_NETUID: u64 = 1024;

// ============================================================================
// CARD MODEL
// ============================================================================

/// What kind of question a card asks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardKind {
    /// Will the subnet's alpha price be at or above `threshold` at the
    /// deadline? Two outcomes: YES (bucket 0) and NO (bucket 1).
    Binary { threshold: f64 },
    /// One winner among N named options.
    Multi { option_names: Vec<String> },
}

impl CardKind {
    pub fn option_count(&self) -> usize {
        match self {
            CardKind::Binary { .. } => 2,
            CardKind::Multi { option_names } => option_names.len(),
        }
    }

    pub fn option_names(&self) -> Vec<String> {
        match self {
            CardKind::Binary { .. } => vec!["Yes".to_string(), "No".to_string()],
            CardKind::Multi { option_names } => option_names.clone(),
        }
    }
}

/// A confirmed (or proposed) card outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// Binary card: true = YES
    Binary(bool),
    /// Multi card: winning option index
    Option(u32),
}

impl Outcome {
    /// Stake bucket this outcome settles on. YES = 0, NO = 1 for binary
    /// cards, the option index for multi cards.
    pub fn bucket(&self) -> usize {
        match self {
            Outcome::Binary(true) => 0,
            Outcome::Binary(false) => 1,
            Outcome::Option(index) => *index as usize,
        }
    }

    /// Check that this outcome is expressible for the given card kind.
    pub fn validate_for(&self, kind: &CardKind) -> Result<(), CardError> {
        match (self, kind) {
            (Outcome::Binary(_), CardKind::Binary { .. }) => Ok(()),
            (Outcome::Option(index), CardKind::Multi { option_names }) => {
                if (*index as usize) < option_names.len() {
                    Ok(())
                } else {
                    Err(CardError::InvalidOutcome {
                        index: *index as usize,
                        option_count: option_names.len(),
                    })
                }
            }
            (Outcome::Option(index), CardKind::Binary { .. }) => Err(CardError::InvalidOutcome {
                index: *index as usize,
                option_count: 2,
            }),
            (Outcome::Binary(_), CardKind::Multi { option_names }) => {
                Err(CardError::InvalidOutcome { index: usize::MAX, option_count: option_names.len() })
            }
        }
    }
}

/// Immutable card record. Only `resolved` and `outcome` are ever written
/// after creation, exactly once, by finalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    /// Subnet the card bets on
    pub netuid: u64,
    #[serde(flatten)]
    pub kind: CardKind,
    /// Unix seconds; betting closes and resolution opens here
    pub deadline: u64,
    pub creator: String,
    pub resolved: bool,
    pub outcome: Option<Outcome>,
    pub creation_time: u64,
    /// Policy snapshot taken at creation; later config changes never touch
    /// a card already in flight
    pub config: EngineConfig,
}

impl Card {
    /// Betting is open strictly before the deadline on an unresolved card.
    pub fn is_open(&self, now: u64) -> bool {
        !self.resolved && now < self.deadline
    }
}

// ============================================================================
// PER-CARD STATE
// ============================================================================

/// Everything the engine tracks for one card. Guarded by the per-card mutex
/// in the store; every mutating operation runs against it atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardState {
    pub card: Card,
    pub totals: StakeTotals,
    /// Fee-net stake per user per outcome bucket
    pub stakes: HashMap<String, Vec<f64>>,
    /// At most one live proposal; cleared when a challenger prevails
    pub proposal: Option<Proposal>,
    /// Redeemable pool frozen at finalize time; payouts draw proportional
    /// shares of this figure while `totals.total_liquidity` counts down
    pub payout_pool: Option<f64>,
}

impl CardState {
    pub fn new(card: Card) -> Self {
        let buckets = card.kind.option_count();
        Self {
            card,
            totals: StakeTotals::new(buckets),
            stakes: HashMap::new(),
            proposal: None,
            payout_pool: None,
        }
    }

    /// A voter's weight: total fee-net stake across all outcome buckets.
    pub fn total_stake_of(&self, account: &str) -> f64 {
        self.stakes
            .get(account)
            .map(|buckets| buckets.iter().sum())
            .unwrap_or(0.0)
    }

    /// Volume-weighted implied odds per bucket, equal split when empty.
    /// Derived at read time; never stored back into stake fields.
    pub fn implied_odds(&self) -> Vec<f64> {
        let total: f64 = self.totals.buckets.iter().sum();
        if total <= 0.0 {
            let equal = 1.0 / self.totals.buckets.len() as f64;
            return vec![equal; self.totals.buckets.len()];
        }
        self.totals.buckets.iter().map(|b| b / total).collect()
    }

    pub fn snapshot(&self) -> CardSnapshot {
        CardSnapshot {
            id: self.card.id,
            netuid: self.card.netuid,
            kind: self.card.kind.clone(),
            option_names: self.card.kind.option_names(),
            deadline: self.card.deadline,
            creator: self.card.creator.clone(),
            resolved: self.card.resolved,
            outcome: self.card.outcome,
            creation_time: self.card.creation_time,
            buckets: self.totals.buckets.clone(),
            total_liquidity: self.totals.total_liquidity,
            fees_collected: self.totals.fees_collected,
            implied_odds: self.implied_odds(),
            has_proposal: self.proposal.is_some(),
        }
    }
}

/// Read-only card view served to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSnapshot {
    pub id: u64,
    pub netuid: u64,
    #[serde(flatten)]
    pub kind: CardKind,
    pub option_names: Vec<String>,
    pub deadline: u64,
    pub creator: String,
    pub resolved: bool,
    pub outcome: Option<Outcome>,
    pub creation_time: u64,
    pub buckets: Vec<f64>,
    pub total_liquidity: f64,
    pub fees_collected: f64,
    pub implied_odds: Vec<f64>,
    pub has_proposal: bool,
}

// ============================================================================
// CARD STORE
// ============================================================================

/// Arena of cards with per-entry locking. Ids are monotone, starting at 1.
#[derive(Debug)]
pub struct CardStore {
    cards: RwLock<HashMap<u64, Arc<Mutex<CardState>>>>,
    next_id: AtomicU64,
}

impl CardStore {
    pub fn new() -> Self {
        Self {
            cards: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a card after creation-time validation. Returns the new id.
    pub fn create_card(
        &self,
        netuid: u64,
        kind: CardKind,
        deadline: u64,
        creator: &str,
        now: u64,
        config: EngineConfig,
    ) -> Result<u64, CardError> {
        if deadline <= now {
            return Err(CardError::InvalidDeadline { deadline, now });
        }
        if netuid == 0 || netuid > MAX_NETUID {
            return Err(CardError::InvalidNetuid(netuid));
        }
        match &kind {
            CardKind::Binary { threshold } => {
                if !(*threshold > 0.0) {
                    return Err(CardError::InvalidThreshold(*threshold));
                }
            }
            CardKind::Multi { option_names } => {
                if option_names.len() < 2 {
                    return Err(CardError::InvalidOptions(
                        "at least 2 options required".to_string(),
                    ));
                }
                if option_names.iter().any(|name| name.trim().is_empty()) {
                    return Err(CardError::InvalidOptions(
                        "option names must be non-empty".to_string(),
                    ));
                }
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let card = Card {
            id,
            netuid,
            kind,
            deadline,
            creator: creator.to_string(),
            resolved: false,
            outcome: None,
            creation_time: now,
            config,
        };

        let mut cards = self.cards.write().unwrap();
        cards.insert(id, Arc::new(Mutex::new(CardState::new(card))));
        Ok(id)
    }

    /// Fetch the lockable entry for a card.
    pub fn entry(&self, id: u64) -> Result<Arc<Mutex<CardState>>, CardError> {
        let cards = self.cards.read().unwrap();
        cards.get(&id).cloned().ok_or(CardError::CardNotFound(id))
    }

    pub fn card_count(&self) -> usize {
        self.cards.read().unwrap().len()
    }

    /// Snapshot every card, sorted by id for stable listings.
    pub fn snapshots(&self) -> Vec<CardSnapshot> {
        let cards = self.cards.read().unwrap();
        let mut all: Vec<CardSnapshot> = cards
            .values()
            .map(|entry| entry.lock().unwrap().snapshot())
            .collect();
        all.sort_by_key(|snapshot| snapshot.id);
        all
    }

    /// Platform fees accumulated across all cards.
    pub fn total_fees(&self) -> f64 {
        let cards = self.cards.read().unwrap();
        cards
            .values()
            .map(|entry| entry.lock().unwrap().totals.fees_collected)
            .sum()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_create_binary_card() {
        let store = CardStore::new();
        let id = store
            .create_card(1, CardKind::Binary { threshold: 0.025 }, 1_000, "alice", 100, config())
            .unwrap();
        assert_eq!(id, 1);

        let entry = store.entry(id).unwrap();
        let state = entry.lock().unwrap();
        assert_eq!(state.card.netuid, 1);
        assert_eq!(state.totals.buckets.len(), 2);
        assert!(!state.card.resolved);
        assert!(state.card.is_open(500));
        assert!(!state.card.is_open(1_000));
    }

    #[test]
    fn test_ids_are_monotone() {
        let store = CardStore::new();
        let a = store
            .create_card(1, CardKind::Binary { threshold: 0.025 }, 1_000, "alice", 100, config())
            .unwrap();
        let b = store
            .create_card(2, CardKind::Binary { threshold: 0.050 }, 1_000, "bob", 100, config())
            .unwrap();
        assert!(b > a);
        assert_eq!(store.card_count(), 2);
    }

    #[test]
    fn test_rejects_past_deadline() {
        let store = CardStore::new();
        let err = store
            .create_card(1, CardKind::Binary { threshold: 0.025 }, 100, "alice", 100, config())
            .unwrap_err();
        assert_eq!(err, CardError::InvalidDeadline { deadline: 100, now: 100 });
    }

    #[test]
    fn test_rejects_bad_netuid() {
        let store = CardStore::new();
        let err = store
            .create_card(0, CardKind::Binary { threshold: 0.025 }, 1_000, "alice", 100, config())
            .unwrap_err();
        assert_eq!(err, CardError::InvalidNetuid(0));

        let err = store
            .create_card(MAX_NETUID + 1, CardKind::Binary { threshold: 0.025 }, 1_000, "a", 100, config())
            .unwrap_err();
        assert_eq!(err, CardError::InvalidNetuid(MAX_NETUID + 1));
    }

    #[test]
    fn test_rejects_bad_multi_options() {
        let store = CardStore::new();
        let err = store
            .create_card(
                1,
                CardKind::Multi { option_names: vec!["only one".to_string()] },
                1_000,
                "alice",
                100,
                config(),
            )
            .unwrap_err();
        assert!(matches!(err, CardError::InvalidOptions(_)));

        let err = store
            .create_card(
                1,
                CardKind::Multi { option_names: vec!["a".to_string(), "  ".to_string()] },
                1_000,
                "alice",
                100,
                config(),
            )
            .unwrap_err();
        assert!(matches!(err, CardError::InvalidOptions(_)));
    }

    #[test]
    fn test_get_missing_card() {
        let store = CardStore::new();
        assert_eq!(store.entry(42).unwrap_err(), CardError::CardNotFound(42));
    }

    #[test]
    fn test_outcome_bucket_mapping() {
        assert_eq!(Outcome::Binary(true).bucket(), 0);
        assert_eq!(Outcome::Binary(false).bucket(), 1);
        assert_eq!(Outcome::Option(3).bucket(), 3);
    }

    #[test]
    fn test_outcome_kind_validation() {
        let binary = CardKind::Binary { threshold: 0.025 };
        let multi = CardKind::Multi {
            option_names: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };

        assert!(Outcome::Binary(true).validate_for(&binary).is_ok());
        assert!(Outcome::Option(2).validate_for(&multi).is_ok());
        assert!(Outcome::Option(3).validate_for(&multi).is_err());
        assert!(Outcome::Option(0).validate_for(&binary).is_err());
        assert!(Outcome::Binary(false).validate_for(&multi).is_err());
    }

    #[test]
    fn test_implied_odds_equal_when_empty() {
        let store = CardStore::new();
        let id = store
            .create_card(
                1,
                CardKind::Multi {
                    option_names: vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
                },
                1_000,
                "alice",
                100,
                config(),
            )
            .unwrap();
        let entry = store.entry(id).unwrap();
        let state = entry.lock().unwrap();
        assert_eq!(state.implied_odds(), vec![0.25; 4]);
    }
}
