use alloy::primitives::{Address, B256, U256};

/// Local order validation and signature errors.
///
/// These are raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("cannot trade 0 amount")]
    ZeroAmount,

    #[error("order expired at block {expires}, current block is {block}")]
    Expired { expires: u64, block: u64 },

    #[error("order is not signed")]
    Unsigned,

    #[error("order hash mismatch, expected: {expected}, got: {actual}")]
    HashMismatch { expected: B256, actual: B256 },

    #[error("signature recovers to {recovered}, expected order maker {expected}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("failed to sign order: {0}")]
    Signing(String),

    #[error("amount {0} is out of range")]
    AmountOutOfRange(U256),
}
