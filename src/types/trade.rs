use alloy::primitives::{Address, TxHash, U256};
use fastnum::UD128;
use serde::{Deserialize, Serialize};

use super::{Market, Side, StateInstant};

/// Executed match, created only from on-chain confirmation.
///
/// Token fields follow the maker's order: `amount_get` of `token_get` went
/// from the taker to the maker, `amount_give` of `token_give` the other way.
/// `side` is the taker's side.
#[derive(Clone, derive_more::Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub timestamp: u64,
    pub maker: Address,
    pub taker: Address,
    pub token_get: Address,
    pub amount_get: U256,
    pub token_give: Address,
    pub amount_give: U256,
    #[debug("{price}")]
    pub price: UD128,
    pub side: Side,
    pub base_amount: U256,
    pub quote_amount: U256,
}

impl Trade {
    /// Builds a trade record within `market`, `None` when the tokens do not
    /// belong to it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: &Market,
        tx_hash: TxHash,
        instant: StateInstant,
        maker: Address,
        taker: Address,
        token_get: Address,
        amount_get: U256,
        token_give: Address,
        amount_give: U256,
    ) -> Option<Self> {
        let view = market.view(token_get, amount_get, token_give, amount_give)?;
        Some(Self {
            tx_hash,
            block_number: instant.block_number(),
            timestamp: instant.block_timestamp(),
            maker,
            taker,
            token_get,
            amount_get,
            token_give,
            amount_give,
            price: view.price,
            // The taker takes the other side of the maker's order
            side: view.side.opposite(),
            base_amount: view.base_amount,
            quote_amount: view.quote_amount,
        })
    }
}
