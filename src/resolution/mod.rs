// ============================================================================
// Resolution Module - Crowd-Verified Outcome Resolution
// ============================================================================
//
// No trusted price oracle. After a card's deadline, anyone may propose the
// outcome by posting a bond; anyone else may dispute it by matching that
// bond, which opens a stake-weighted vote. Economics do the policing: the
// losing side of a dispute forfeits its bond to the winning side.
//
//   - coordinator: propose -> dispute -> vote -> finalize state machine
//   - payout: proportional redemption once a card is finalized
//
// ============================================================================

pub mod coordinator;
pub mod payout;

pub use coordinator::*;
pub use payout::*;
