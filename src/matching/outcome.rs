use std::fmt;

use alloy::primitives::{Address, B256, TxHash, U256};
use fastnum::UD128;

use crate::types::{Order, Trade};

/// Executed trade against one resting order.
#[derive(Clone, derive_more::Debug)]
pub struct Fill {
    pub order_hash: B256,
    pub maker: Address,
    #[debug("{price}")]
    pub price: UD128,
    /// Base amount exchanged.
    pub base_amount: U256,
    /// Trade amount in the maker's `token_get`, as submitted.
    pub amount: U256,
    pub tx_hash: TxHash,
    pub trade: Option<Trade>,
}

/// Why a candidate was passed over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Expired { expires: u64, block: u64 },
    Unavailable,
    TooSmall,
    InsufficientBalance { required: U256, available: U256 },
    TestTradeFailed,
    Venue(String),
}

/// Candidate passed over during the walk.
#[derive(Clone, Debug)]
pub struct Skipped {
    pub order_hash: B256,
    pub reason: SkipReason,
}

/// Result of a matching walk.
#[derive(Clone, Debug, Default)]
pub struct MatchOutcome {
    pub fills: Vec<Fill>,
    pub skipped: Vec<Skipped>,
    /// New resting order for the unmatched remainder, if one was posted.
    pub resting: Option<Order>,
    /// Base amount neither filled nor posted.
    pub remaining: U256,
    /// Reason the walk stopped early, or the remainder could not be posted.
    pub stopped: Option<String>,
}

impl MatchOutcome {
    /// Total base amount filled.
    pub fn filled(&self) -> U256 {
        self.fills
            .iter()
            .fold(U256::ZERO, |acc, f| acc + f.base_amount)
    }

    pub fn is_complete(&self) -> bool {
        self.stopped.is_none() && self.remaining.is_zero()
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Expired { expires, block } => {
                write!(f, "order expired at block {expires}, current block is {block}")
            }
            SkipReason::Unavailable => write!(f, "order is filled or cancelled"),
            SkipReason::TooSmall => write!(f, "available volume too small to trade"),
            SkipReason::InsufficientBalance {
                required,
                available,
            } => write!(
                f,
                "insufficient exchange balance, required: {required}, available: {available}"
            ),
            SkipReason::TestTradeFailed => write!(f, "trade would fail"),
            SkipReason::Venue(reason) => write!(f, "{reason}"),
        }
    }
}
