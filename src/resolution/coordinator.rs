// ============================================================================
// Resolution Coordinator - AlphaCards Betting Engine
// ============================================================================
//
// Per-card state machine:
//
//   Open -> AwaitingProposal -> Challenge -> Voting -> Finalized
//                                   \__________________/
//                                    (uncontested path skips Voting)
//
// Open -> AwaitingProposal happens by itself at the deadline; it is a guard
// condition, not a call. Every operation here is a pure function of
// (now, state, input): callers pass the clock in, so the machine tests
// without one.
//
// Guard failures never partially mutate state. Bond money is escrowed by the
// coordinator and owned by nobody until finalize names the winning side.
//
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::store::{CardState, Outcome};
use crate::error::CardError;

// ============================================================================
// PROPOSAL STATE
// ============================================================================

/// One recorded vote. Weight is the voter's total stake across all outcome
/// buckets, captured at vote time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteRecord {
    pub supports_proposal: bool,
    pub weight: f64,
    pub vote_time: u64,
}

/// The live (or finalized) resolution proposal for a card. At most one
/// exists at a time; a disputed proposal is voted on, never replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub proposer: String,
    pub proposed_outcome: Outcome,
    pub bond_amount: f64,
    pub proposal_time: u64,
    pub disputed: bool,
    pub challenger: Option<String>,
    pub challenger_bond: f64,
    /// Voting clock starts here, not at proposal time
    pub dispute_time: Option<u64>,
    pub yes_votes: f64,
    pub no_votes: f64,
    pub voting_active: bool,
    pub voters: HashMap<String, VoteRecord>,
}

impl Proposal {
    fn new(proposer: &str, outcome: Outcome, bond: f64, now: u64) -> Self {
        Self {
            proposer: proposer.to_string(),
            proposed_outcome: outcome,
            bond_amount: bond,
            proposal_time: now,
            disputed: false,
            challenger: None,
            challenger_bond: 0.0,
            dispute_time: None,
            yes_votes: 0.0,
            no_votes: 0.0,
            voting_active: false,
            voters: HashMap::new(),
        }
    }

    pub fn dispute_window_open(&self, now: u64, dispute_period_secs: u64) -> bool {
        !self.disputed && now < self.proposal_time + dispute_period_secs
    }

    pub fn voting_window_open(&self, now: u64, voting_period_secs: u64) -> bool {
        match self.dispute_time {
            Some(dispute_time) => self.voting_active && now < dispute_time + voting_period_secs,
            None => false,
        }
    }
}

/// Lifecycle phase of a card, derived from its state and the clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Pre-deadline, stakes accepted
    Open,
    /// Deadline passed, no live proposal
    AwaitingProposal,
    /// Proposal live, dispute window open
    Challenge,
    /// Proposal disputed, vote in progress
    Voting,
    /// Outcome confirmed
    Finalized,
}

/// Where the escrowed bonds go when finalize succeeds. The caller moves the
/// money; the coordinator only decides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Settlement {
    /// Nobody disputed: outcome stands, proposer's bond comes back.
    Uncontested { outcome: Outcome, proposer: String, refund: f64 },
    /// Vote backed the proposer: outcome stands, proposer takes both bonds.
    ProposerWins { outcome: Outcome, proposer: String, award: f64 },
    /// Vote backed the challenger: no outcome is confirmed, the proposal
    /// slot clears so the card can be re-proposed, challenger takes both
    /// bonds.
    ChallengerWins { challenger: String, award: f64 },
}

// ============================================================================
// COORDINATOR OPERATIONS
// ============================================================================

impl CardState {
    /// Current lifecycle phase.
    pub fn phase(&self, now: u64) -> Phase {
        if self.card.resolved {
            return Phase::Finalized;
        }
        if now < self.card.deadline {
            return Phase::Open;
        }
        match &self.proposal {
            None => Phase::AwaitingProposal,
            Some(proposal) if proposal.disputed => Phase::Voting,
            Some(_) => Phase::Challenge,
        }
    }

    /// Propose the card's outcome, bonded by `bond`. First call after the
    /// deadline wins the proposal slot.
    pub fn propose(
        &mut self,
        outcome: Outcome,
        bond: f64,
        proposer: &str,
        now: u64,
    ) -> Result<(), CardError> {
        if self.card.resolved {
            return Err(CardError::AlreadyResolved);
        }
        if now < self.card.deadline {
            return Err(CardError::DeadlineNotReached { deadline: self.card.deadline, now });
        }
        if self.proposal.is_some() {
            return Err(CardError::AlreadyProposed);
        }
        outcome.validate_for(&self.card.kind)?;
        let required = self.card.config.resolution_bond;
        if bond < required {
            return Err(CardError::InsufficientBond { required, provided: bond });
        }

        self.proposal = Some(Proposal::new(proposer, outcome, bond, now));
        info!(card_id = self.card.id, proposer, bond, "outcome proposed");
        Ok(())
    }

    /// Challenge the live proposal. The challenger must at least match the
    /// proposer's bond, which makes frivolous disputes expensive. Starts the
    /// voting clock at dispute time.
    pub fn dispute(
        &mut self,
        challenger_bond: f64,
        challenger: &str,
        now: u64,
    ) -> Result<(), CardError> {
        if self.card.resolved {
            return Err(CardError::AlreadyResolved);
        }
        let dispute_period = self.card.config.dispute_period_secs;
        let proposal = self.proposal.as_mut().ok_or(CardError::NoProposal)?;

        if proposal.disputed {
            return Err(CardError::AlreadyDisputed);
        }
        if challenger == proposal.proposer {
            return Err(CardError::SelfDispute);
        }
        if now >= proposal.proposal_time + dispute_period {
            return Err(CardError::DisputeWindowClosed);
        }
        if challenger_bond < proposal.bond_amount {
            return Err(CardError::BondMismatch {
                required: proposal.bond_amount,
                provided: challenger_bond,
            });
        }

        proposal.disputed = true;
        proposal.challenger = Some(challenger.to_string());
        proposal.challenger_bond = challenger_bond;
        proposal.dispute_time = Some(now);
        proposal.voting_active = true;
        info!(card_id = self.card.id, challenger, challenger_bond, "proposal disputed");
        Ok(())
    }

    /// Cast a stake-weighted vote on the disputed proposal. One vote per
    /// address; weight is total stake in the card at vote time.
    pub fn vote(
        &mut self,
        voter: &str,
        supports_proposal: bool,
        now: u64,
    ) -> Result<VoteRecord, CardError> {
        if self.card.resolved {
            return Err(CardError::AlreadyResolved);
        }
        let weight = self.total_stake_of(voter);
        let voting_period = self.card.config.voting_period_secs;
        let proposal = self.proposal.as_mut().ok_or(CardError::NoProposal)?;

        if !proposal.voting_window_open(now, voting_period) {
            return Err(CardError::VotingClosed);
        }
        if proposal.voters.contains_key(voter) {
            return Err(CardError::AlreadyVoted(voter.to_string()));
        }
        if !(weight > 0.0) {
            return Err(CardError::NoStake(voter.to_string()));
        }

        let record = VoteRecord { supports_proposal, weight, vote_time: now };
        proposal.voters.insert(voter.to_string(), record.clone());
        if supports_proposal {
            proposal.yes_votes += weight;
        } else {
            proposal.no_votes += weight;
        }
        info!(card_id = self.card.id, voter, supports_proposal, weight, "vote recorded");
        Ok(record)
    }

    /// Drive the card to its terminal state once the relevant window has
    /// elapsed. Callable by anyone. Returns the bond settlement for the
    /// caller to execute as the final step.
    pub fn finalize(&mut self, now: u64) -> Result<Settlement, CardError> {
        if self.card.resolved {
            return Err(CardError::AlreadyResolved);
        }
        let dispute_period = self.card.config.dispute_period_secs;
        let voting_period = self.card.config.voting_period_secs;
        let proposal = self.proposal.as_ref().ok_or(CardError::NoProposal)?;

        if !proposal.disputed {
            // Uncontested path: the dispute window must have fully elapsed.
            if now < proposal.proposal_time + dispute_period {
                return Err(CardError::DisputeWindowOpen);
            }
            let outcome = proposal.proposed_outcome;
            let proposer = proposal.proposer.clone();
            let refund = proposal.bond_amount;
            self.confirm_outcome(outcome);
            info!(card_id = self.card.id, proposer = %proposer, "finalized uncontested");
            return Ok(Settlement::Uncontested { outcome, proposer, refund });
        }

        // Contested path: the voting window must have fully elapsed.
        let dispute_time = proposal.dispute_time.unwrap_or(proposal.proposal_time);
        if now < dispute_time + voting_period {
            return Err(CardError::VotingNotEnded);
        }

        let both_bonds = proposal.bond_amount + proposal.challenger_bond;
        if proposal.yes_votes > proposal.no_votes {
            let outcome = proposal.proposed_outcome;
            let proposer = proposal.proposer.clone();
            self.confirm_outcome(outcome);
            info!(card_id = self.card.id, proposer = %proposer, "finalized: proposer prevailed");
            Ok(Settlement::ProposerWins { outcome, proposer, award: both_bonds })
        } else {
            // Challenger prevails: the disputed claim is rejected without
            // inferring an alternate outcome. The proposal slot clears so
            // the card can be re-proposed.
            let challenger = proposal
                .challenger
                .clone()
                .unwrap_or_else(|| proposal.proposer.clone());
            self.proposal = None;
            info!(card_id = self.card.id, challenger = %challenger, "proposal rejected: challenger prevailed");
            Ok(Settlement::ChallengerWins { challenger, award: both_bonds })
        }
    }

    /// Write the outcome exactly once and freeze the redeemable pool.
    fn confirm_outcome(&mut self, outcome: Outcome) {
        self.card.resolved = true;
        self.card.outcome = Some(outcome);
        self.payout_pool = Some(self.totals.total_liquidity);
        if let Some(proposal) = self.proposal.as_mut() {
            proposal.voting_active = false;
        }
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

    const DEADLINE: u64 = 86_400;
    const DAY: u64 = 86_400;

    fn state_with_stakes() -> CardState {
        let mut state = CardState::new(Card {
            id: 7,
            netuid: 1,
            kind: CardKind::Binary { threshold: 0.025 },
            deadline: DEADLINE,
            creator: "creator".to_string(),
            resolved: false,
            outcome: None,
            creation_time: 0,
            config: EngineConfig::default(),
        });
        state.stake(0, 10.0, "alice", 100).unwrap(); // 9.75 net on YES
        state.stake(1, 5.0, "bob", 200).unwrap(); // 4.875 net on NO
        state
    }

    #[test]
    fn test_phase_progression() {
        let mut state = state_with_stakes();
        assert_eq!(state.phase(100), Phase::Open);
        assert_eq!(state.phase(DEADLINE), Phase::AwaitingProposal);

        state.propose(Outcome::Binary(true), 10.0, "alice", DEADLINE + 10).unwrap();
        assert_eq!(state.phase(DEADLINE + 10), Phase::Challenge);

        state.dispute(10.0, "bob", DEADLINE + 20).unwrap();
        assert_eq!(state.phase(DEADLINE + 20), Phase::Voting);
    }

    #[test]
    fn test_propose_before_deadline_rejected() {
        let mut state = state_with_stakes();
        let err = state.propose(Outcome::Binary(true), 10.0, "alice", 500).unwrap_err();
        assert_eq!(err, CardError::DeadlineNotReached { deadline: DEADLINE, now: 500 });
        assert!(state.proposal.is_none());
    }

    #[test]
    fn test_propose_twice_rejected() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "alice", DEADLINE + 1).unwrap();
        let err = state.propose(Outcome::Binary(false), 10.0, "bob", DEADLINE + 2).unwrap_err();
        assert_eq!(err, CardError::AlreadyProposed);
    }

    #[test]
    fn test_propose_underfunded_bond_rejected() {
        let mut state = state_with_stakes();
        let err = state.propose(Outcome::Binary(true), 9.99, "alice", DEADLINE + 1).unwrap_err();
        assert_eq!(err, CardError::InsufficientBond { required: 10.0, provided: 9.99 });
    }

    #[test]
    fn test_propose_invalid_outcome_rejected() {
        let mut state = state_with_stakes();
        let err = state.propose(Outcome::Option(1), 10.0, "alice", DEADLINE + 1).unwrap_err();
        assert!(matches!(err, CardError::InvalidOutcome { .. }));
    }

    #[test]
    fn test_dispute_requires_matching_bond() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 12.0, "alice", DEADLINE + 1).unwrap();

        let err = state.dispute(11.0, "bob", DEADLINE + 2).unwrap_err();
        assert_eq!(err, CardError::BondMismatch { required: 12.0, provided: 11.0 });
        assert!(!state.proposal.as_ref().unwrap().disputed);

        state.dispute(12.0, "bob", DEADLINE + 2).unwrap();
        let proposal = state.proposal.as_ref().unwrap();
        assert!(proposal.disputed);
        assert!(proposal.voting_active);
        assert_eq!(proposal.dispute_time, Some(DEADLINE + 2));
    }

    #[test]
    fn test_dispute_window_closes() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "alice", DEADLINE + 1).unwrap();
        let err = state.dispute(10.0, "bob", DEADLINE + 1 + DAY).unwrap_err();
        assert_eq!(err, CardError::DisputeWindowClosed);
    }

    #[test]
    fn test_cannot_dispute_own_proposal() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "alice", DEADLINE + 1).unwrap();
        assert_eq!(state.dispute(10.0, "alice", DEADLINE + 2).unwrap_err(), CardError::SelfDispute);
    }

    #[test]
    fn test_dispute_twice_rejected() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "alice", DEADLINE + 1).unwrap();
        state.dispute(10.0, "bob", DEADLINE + 2).unwrap();
        assert_eq!(state.dispute(10.0, "carol", DEADLINE + 3).unwrap_err(), CardError::AlreadyDisputed);
    }

    #[test]
    fn test_vote_weight_is_total_stake() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.dispute(10.0, "challenger", DEADLINE + 2).unwrap();

        let record = state.vote("alice", true, DEADLINE + 3).unwrap();
        assert_eq!(record.weight, 9.75);
        state.vote("bob", false, DEADLINE + 4).unwrap();

        let proposal = state.proposal.as_ref().unwrap();
        assert_eq!(proposal.yes_votes, 9.75);
        assert_eq!(proposal.no_votes, 4.875);
    }

    #[test]
    fn test_double_vote_rejected() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.dispute(10.0, "challenger", DEADLINE + 2).unwrap();

        state.vote("alice", true, DEADLINE + 3).unwrap();
        let err = state.vote("alice", false, DEADLINE + 4).unwrap_err();
        assert_eq!(err, CardError::AlreadyVoted("alice".to_string()));
        // The first vote still stands, untouched
        assert_eq!(state.proposal.as_ref().unwrap().yes_votes, 9.75);
        assert_eq!(state.proposal.as_ref().unwrap().no_votes, 0.0);
    }

    #[test]
    fn test_zero_stake_cannot_vote() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.dispute(10.0, "challenger", DEADLINE + 2).unwrap();
        let err = state.vote("stranger", true, DEADLINE + 3).unwrap_err();
        assert_eq!(err, CardError::NoStake("stranger".to_string()));
    }

    #[test]
    fn test_vote_without_dispute_rejected() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        assert_eq!(state.vote("alice", true, DEADLINE + 2).unwrap_err(), CardError::VotingClosed);
    }

    #[test]
    fn test_vote_after_window_rejected() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.dispute(10.0, "challenger", DEADLINE + 2).unwrap();
        let err = state.vote("alice", true, DEADLINE + 2 + DAY).unwrap_err();
        assert_eq!(err, CardError::VotingClosed);
    }

    #[test]
    fn test_uncontested_finalize() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();

        // Too early while the dispute window is open
        assert_eq!(state.finalize(DEADLINE + 100).unwrap_err(), CardError::DisputeWindowOpen);

        let settlement = state.finalize(DEADLINE + 1 + DAY).unwrap();
        assert_eq!(
            settlement,
            Settlement::Uncontested {
                outcome: Outcome::Binary(true),
                proposer: "proposer".to_string(),
                refund: 10.0,
            }
        );
        assert!(state.card.resolved);
        assert_eq!(state.card.outcome, Some(Outcome::Binary(true)));
        assert_eq!(state.payout_pool, Some(14.625));
    }

    #[test]
    fn test_contested_finalize_proposer_wins() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.dispute(10.0, "challenger", DEADLINE + 2).unwrap();
        state.vote("alice", true, DEADLINE + 3).unwrap(); // 9.75 for
        state.vote("bob", false, DEADLINE + 4).unwrap(); // 4.875 against

        assert_eq!(state.finalize(DEADLINE + 100).unwrap_err(), CardError::VotingNotEnded);

        let settlement = state.finalize(DEADLINE + 2 + DAY).unwrap();
        assert_eq!(
            settlement,
            Settlement::ProposerWins {
                outcome: Outcome::Binary(true),
                proposer: "proposer".to_string(),
                award: 20.0,
            }
        );
        assert!(state.card.resolved);
    }

    #[test]
    fn test_contested_finalize_challenger_wins_reopens_proposal() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(false), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.dispute(10.0, "challenger", DEADLINE + 2).unwrap();
        state.vote("alice", false, DEADLINE + 3).unwrap(); // 9.75 against
        state.vote("bob", true, DEADLINE + 4).unwrap(); // 4.875 for

        let settlement = state.finalize(DEADLINE + 2 + DAY).unwrap();
        assert_eq!(
            settlement,
            Settlement::ChallengerWins { challenger: "challenger".to_string(), award: 20.0 }
        );

        // Card stays unresolved and the slot reopens
        assert!(!state.card.resolved);
        assert!(state.proposal.is_none());
        state.propose(Outcome::Binary(true), 10.0, "proposer2", DEADLINE + 3 + DAY).unwrap();
    }

    #[test]
    fn test_tie_goes_to_challenger() {
        let mut state = state_with_stakes();
        // Equalize the stakes so both voters carry identical weight
        state.stake(1, 5.0, "bob", 300).unwrap(); // bob now 9.75 on NO
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.dispute(10.0, "challenger", DEADLINE + 2).unwrap();
        state.vote("alice", true, DEADLINE + 3).unwrap();
        state.vote("bob", false, DEADLINE + 4).unwrap();

        let settlement = state.finalize(DEADLINE + 2 + DAY).unwrap();
        assert!(matches!(settlement, Settlement::ChallengerWins { .. }));
        assert!(!state.card.resolved);
    }

    #[test]
    fn test_finalize_is_terminal() {
        let mut state = state_with_stakes();
        state.propose(Outcome::Binary(true), 10.0, "proposer", DEADLINE + 1).unwrap();
        state.finalize(DEADLINE + 1 + DAY).unwrap();

        let err = state.finalize(DEADLINE + 2 + DAY).unwrap_err();
        assert_eq!(err, CardError::AlreadyResolved);
        assert_eq!(state.card.outcome, Some(Outcome::Binary(true)));
    }

    #[test]
    fn test_finalize_without_proposal_rejected() {
        let mut state = state_with_stakes();
        assert_eq!(state.finalize(DEADLINE + DAY).unwrap_err(), CardError::NoProposal);
    }
}
