// ============================================================================
// Error Types - AlphaCards Betting Engine
// ============================================================================
//
// Every operation returns a typed error to the caller. Nothing is retried
// internally; a failed guard leaves the card untouched and the caller decides
// whether to resubmit once the phase opens.
//
// ============================================================================

use serde::{Deserialize, Serialize};

/// All failure modes of the card engine.
///
/// Grouped by taxonomy: validation (bad input), state (wrong phase),
/// economic (bad value), not-found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CardError {
    // ===== VALIDATION =====
    /// Deadline is not in the future
    InvalidDeadline { deadline: u64, now: u64 },
    /// Subnet id outside the accepted range
    InvalidNetuid(u64),
    /// Multi card needs at least 2 non-empty option names
    InvalidOptions(String),
    /// Binary card threshold price must be positive
    InvalidThreshold(f64),
    /// Outcome index out of range for the card kind
    InvalidOutcome { index: usize, option_count: usize },
    /// Stake amount must be positive
    ZeroStake,

    // ===== NOT FOUND =====
    CardNotFound(u64),
    AccountNotFound(String),

    // ===== STATE =====
    /// Betting period ended (deadline passed or card resolved)
    CardClosed,
    /// Card already has a confirmed outcome
    AlreadyResolved,
    /// Redemption requires a resolved card
    NotResolved,
    /// A live proposal already exists for this card
    AlreadyProposed,
    /// Operation requires a live proposal
    NoProposal,
    /// Resolution cannot start before the card deadline
    DeadlineNotReached { deadline: u64, now: u64 },
    /// Proposal has already been disputed
    AlreadyDisputed,
    /// Proposer cannot dispute their own proposal
    SelfDispute,
    /// Dispute window has elapsed
    DisputeWindowClosed,
    /// Uncontested finalize must wait out the dispute window
    DisputeWindowOpen,
    /// Voting is not open (never disputed, or window elapsed)
    VotingClosed,
    /// Contested finalize must wait out the voting window
    VotingNotEnded,
    /// Each address votes at most once per card
    AlreadyVoted(String),
    /// Vote weight comes from stake; zero stake cannot vote
    NoStake(String),

    // ===== ECONOMIC =====
    /// Proposal bond below the required resolution bond
    InsufficientBond { required: f64, provided: f64 },
    /// Challenger bond must at least match the proposer's bond
    BondMismatch { required: f64, provided: f64 },
    /// No stake on the winning outcome (or already redeemed)
    NothingToRedeem,
    /// Ledger balance too low to cover a stake or bond
    InsufficientBalance { available: f64, required: f64 },
}

impl CardError {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            CardError::InvalidDeadline { .. } => "INVALID_DEADLINE",
            CardError::InvalidNetuid(_) => "INVALID_NETUID",
            CardError::InvalidOptions(_) => "INVALID_OPTIONS",
            CardError::InvalidThreshold(_) => "INVALID_THRESHOLD",
            CardError::InvalidOutcome { .. } => "INVALID_OUTCOME",
            CardError::ZeroStake => "ZERO_STAKE",
            CardError::CardNotFound(_) => "CARD_NOT_FOUND",
            CardError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            CardError::CardClosed => "CARD_CLOSED",
            CardError::AlreadyResolved => "ALREADY_RESOLVED",
            CardError::NotResolved => "NOT_RESOLVED",
            CardError::AlreadyProposed => "ALREADY_PROPOSED",
            CardError::NoProposal => "NO_PROPOSAL",
            CardError::DeadlineNotReached { .. } => "DEADLINE_NOT_REACHED",
            CardError::AlreadyDisputed => "ALREADY_DISPUTED",
            CardError::SelfDispute => "SELF_DISPUTE",
            CardError::DisputeWindowClosed => "DISPUTE_WINDOW_CLOSED",
            CardError::DisputeWindowOpen => "DISPUTE_WINDOW_OPEN",
            CardError::VotingClosed => "VOTING_CLOSED",
            CardError::VotingNotEnded => "VOTING_NOT_ENDED",
            CardError::AlreadyVoted(_) => "ALREADY_VOTED",
            CardError::NoStake(_) => "NO_STAKE",
            CardError::InsufficientBond { .. } => "INSUFFICIENT_BOND",
            CardError::BondMismatch { .. } => "BOND_MISMATCH",
            CardError::NothingToRedeem => "NOTHING_TO_REDEEM",
            CardError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
        }
    }
}

impl std::fmt::Display for CardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardError::InvalidDeadline { deadline, now } => {
                write!(f, "Deadline {} must be in the future (now {})", deadline, now)
            }
            CardError::InvalidNetuid(netuid) => write!(f, "Invalid netuid: {}", netuid),
            CardError::InvalidOptions(msg) => write!(f, "Invalid options: {}", msg),
            CardError::InvalidThreshold(t) => write!(f, "Invalid threshold price: {}", t),
            CardError::InvalidOutcome { index, option_count } => {
                write!(f, "Invalid outcome index {} (card has {} options)", index, option_count)
            }
            CardError::ZeroStake => write!(f, "Stake amount must be positive"),
            CardError::CardNotFound(id) => write!(f, "Card {} not found", id),
            CardError::AccountNotFound(account) => write!(f, "Account {} not found", account),
            CardError::CardClosed => write!(f, "Betting period ended"),
            CardError::AlreadyResolved => write!(f, "Card already resolved"),
            CardError::NotResolved => write!(f, "Card not resolved yet"),
            CardError::AlreadyProposed => write!(f, "A resolution proposal already exists"),
            CardError::NoProposal => write!(f, "No resolution proposal exists"),
            CardError::DeadlineNotReached { deadline, now } => {
                write!(f, "Resolution opens at {} (now {})", deadline, now)
            }
            CardError::AlreadyDisputed => write!(f, "Proposal already disputed"),
            CardError::SelfDispute => write!(f, "Proposer cannot dispute own proposal"),
            CardError::DisputeWindowClosed => write!(f, "Dispute window closed"),
            CardError::DisputeWindowOpen => write!(f, "Dispute window still open"),
            CardError::VotingClosed => write!(f, "Voting is not open for this card"),
            CardError::VotingNotEnded => write!(f, "Voting window still open"),
            CardError::AlreadyVoted(voter) => write!(f, "{} already voted", voter),
            CardError::NoStake(voter) => write!(f, "{} holds no stake in this card", voter),
            CardError::InsufficientBond { required, provided } => {
                write!(f, "Bond {} below required {}", provided, required)
            }
            CardError::BondMismatch { required, provided } => {
                write!(f, "Challenger bond {} must match proposer bond {}", provided, required)
            }
            CardError::NothingToRedeem => write!(f, "No winnings to redeem"),
            CardError::InsufficientBalance { available, required } => {
                write!(f, "Insufficient balance: have {}, need {}", available, required)
            }
        }
    }
}

impl std::error::Error for CardError {}
