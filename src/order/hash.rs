use alloy::primitives::{Address, B256, U256};
use alloy_sol_types::SolValue;
use sha2::{Digest, Sha256};

/// Digest of the order parameters as computed by the exchange contract.
///
/// Fields are tightly packed in this order: exchange contract address,
/// `token_get`, `amount_get`, `token_give`, `amount_give`, `expires`, `nonce`.
/// Addresses take 20 bytes, integers 32 bytes big-endian. The packed bytes
/// are hashed with SHA-256.
pub fn order_hash(
    exchange: Address,
    token_get: Address,
    amount_get: U256,
    token_give: Address,
    amount_give: U256,
    expires: u64,
    nonce: U256,
) -> B256 {
    let packed = (
        exchange,
        token_get,
        amount_get,
        token_give,
        amount_give,
        U256::from(expires),
        nonce,
    )
        .abi_encode_packed();
    B256::from_slice(Sha256::digest(&packed).as_slice())
}
