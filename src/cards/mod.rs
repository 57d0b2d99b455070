// ============================================================================
// Cards Module - Core Card & Stake Accounting
// ============================================================================
//
// This module contains the card (market) side of the engine:
//   - store: card records, id allocation, creation validation, snapshots
//   - stake: per-outcome stake pools with platform fee accounting
//
// Resolution and payout live in the `resolution` module; they operate on the
// same per-card state under the same per-card lock.
//
// ============================================================================

pub mod stake;
pub mod store;

pub use stake::*;
pub use store::*;
