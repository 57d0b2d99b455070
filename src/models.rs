// ============================================================================
// API Models - AlphaCards Betting Engine
// ============================================================================
//
// Request and response bodies for the dashboard-facing HTTP API. The engine
// types themselves serialize cleanly; these wrappers exist where the wire
// shape differs from the internal one.
//
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::cards::store::{CardKind, Outcome};
use crate::resolution::coordinator::{Phase, Proposal};

/// POST /cards request body
///
/// Binary card:
/// ```json
/// { "netuid": 1, "kind": "binary", "threshold": 0.025,
///   "deadline": 1767225600, "creator": "5Grw...utQY" }
/// ```
///
/// Multi card:
/// ```json
/// { "netuid": 8, "kind": "multi", "option_names": ["A", "B", "C"],
///   "deadline": 1767225600, "creator": "5Grw...utQY" }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub netuid: u64,
    #[serde(flatten)]
    pub kind: CardKind,
    pub deadline: u64,
    pub creator: String,
}

/// POST /cards/:id/stake request body
#[derive(Debug, Deserialize)]
pub struct StakeRequest {
    pub account: String,
    /// Outcome bucket index (binary: 0 = YES, 1 = NO)
    pub outcome: usize,
    pub amount: f64,
}

/// POST /cards/:id/propose request body
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub account: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub bond: f64,
}

/// POST /cards/:id/dispute request body
#[derive(Debug, Deserialize)]
pub struct DisputeRequest {
    pub account: String,
    pub bond: f64,
}

/// POST /cards/:id/vote request body
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub account: String,
    pub supports: bool,
}

/// POST /cards/:id/redeem request body
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub account: String,
}

/// POST /transfer request body
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

/// GET /cards/:id/proposal response payload. What the resolution panel
/// renders: who proposed what, which window is running, and the tallies.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub proposer: String,
    pub proposed_outcome: Outcome,
    pub bond_amount: f64,
    pub proposal_time: u64,
    pub disputed: bool,
    pub challenger: Option<String>,
    pub challenger_bond: f64,
    pub dispute_time: Option<u64>,
    pub yes_votes: f64,
    pub no_votes: f64,
    pub voting_active: bool,
    pub vote_count: usize,
    pub phase: Phase,
}

impl ProposalView {
    pub fn from_proposal(proposal: &Proposal, phase: Phase) -> Self {
        Self {
            proposer: proposal.proposer.clone(),
            proposed_outcome: proposal.proposed_outcome,
            bond_amount: proposal.bond_amount,
            proposal_time: proposal.proposal_time,
            disputed: proposal.disputed,
            challenger: proposal.challenger.clone(),
            challenger_bond: proposal.challenger_bond,
            dispute_time: proposal.dispute_time,
            yes_votes: proposal.yes_votes,
            no_votes: proposal.no_votes,
            voting_active: proposal.voting_active,
            vote_count: proposal.voters.len(),
            phase,
        }
    }
}
