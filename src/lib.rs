// ============================================================================
// AlphaCards Betting Engine
// ============================================================================
//
// Prediction-market engine for Bittensor subnet tokens. Users stake TAO on
// whether a subnet's alpha price clears a threshold by a deadline; outcomes
// settle through a bonded propose/dispute/vote challenge game and winners
// redeem the pooled liquidity pro rata.
//
// ============================================================================

pub mod app_state;
pub mod cards;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod resolution;
pub mod routes;

// ===== RE-EXPORTS =====

pub use app_state::{AppState, SharedState};
pub use cards::stake::{StakeReceipt, StakeTotals};
pub use cards::store::{Card, CardKind, CardState, CardStore, Outcome, MAX_NETUID};
pub use config::EngineConfig;
pub use error::CardError;
pub use ledger::{Ledger, LedgerTx, TxType};
pub use resolution::coordinator::{Phase, Proposal, Settlement, VoteRecord};
pub use resolution::payout::RedeemReceipt;
pub use routes::build_router;
