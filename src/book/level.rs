use alloy::primitives::{B256, U256};
use fastnum::UD128;

/// Aggregated orders at a single price.
#[derive(Clone, derive_more::Debug, Default, PartialEq, Eq)]
pub struct Level {
    #[debug("{price}")]
    price: UD128,
    base_amount: U256,
    quote_amount: U256,
    orders: Vec<B256>,
}

impl Level {
    pub(crate) fn new(price: UD128) -> Self {
        Self {
            price,
            ..Default::default()
        }
    }

    pub(crate) fn add(&mut self, hash: B256, base_amount: U256, quote_amount: U256) {
        self.base_amount += base_amount;
        self.quote_amount += quote_amount;
        self.orders.push(hash);
    }

    pub fn price(&self) -> UD128 {
        self.price
    }

    /// Total remaining base amount at this price.
    pub fn base_amount(&self) -> U256 {
        self.base_amount
    }

    /// Total remaining quote amount at this price.
    pub fn quote_amount(&self) -> U256 {
        self.quote_amount
    }

    /// Hashes of the orders at this price, in insertion order.
    pub fn orders(&self) -> &[B256] {
        &self.orders
    }

    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }
}
