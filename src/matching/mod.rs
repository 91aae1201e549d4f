//! Greedy matching of a new order against resting counter-orders.
//!
//! [`select_candidates`] is the pure part: which resting orders cross the
//! new order's limit, best price first. [`Taker`] walks those candidates
//! against live exchange state, trading each one it can, and posts the
//! unmatched remainder as a new signed resting order.
//!
//! This is not a matching engine. The exchange contract is the only
//! authority on fulfillability, each fill is an independent transaction,
//! and two clients racing for the same order simply see one of them fail.

mod outcome;
mod select;
mod taker;

pub use outcome::{Fill, MatchOutcome, SkipReason, Skipped};
pub use select::{Candidate, select_candidates};
pub use taker::{DEFAULT_EXPIRY_BLOCKS, MatchRequest, Taker, TakerConfig};
