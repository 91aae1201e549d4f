//! Shared off-chain order book cache and trade log.
//!
//! The store is never authoritative: the exchange contract decides whether
//! an order is still fulfillable. Records here only index signed orders and
//! confirmed trades so other clients can discover them.

mod memory;

pub use memory::{MemoryStore, Snapshot};

use std::future::Future;

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::types::{Market, Order, Trade};

/// Store operation error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("order not found: {0}")]
    OrderNotFound(B256),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Signed order along with its mutable bookkeeping flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order: Order,
    pub is_active: bool,
    pub is_cancelled: bool,
    /// Filled amount in the order's `token_get`.
    pub amount_filled: U256,
}

impl OrderRecord {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            is_active: true,
            is_cancelled: false,
            amount_filled: U256::ZERO,
        }
    }

    /// Unfilled amount in the order's `token_get`.
    pub fn remaining_get(&self) -> U256 {
        self.order.amount_get().saturating_sub(self.amount_filled)
    }

    pub fn is_open(&self) -> bool {
        self.is_active && !self.is_cancelled && !self.remaining_get().is_zero()
    }
}

/// Storage operations for orders and trades.
///
/// Implementations must be thread-safe. Callers treat failures as
/// non-fatal and degrade to empty results.
pub trait OrderStore: Send + Sync {
    /// Save a signed order, replacing if it exists.
    fn save_order(&self, order: &Order) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Open orders belonging to the market.
    fn active_orders(
        &self,
        market: &Market,
    ) -> impl Future<Output = Result<Vec<OrderRecord>, StoreError>> + Send;

    /// Record the filled amount reported by the exchange. Orders filled
    /// completely become inactive.
    fn set_amount_filled(
        &self,
        hash: B256,
        amount_filled: U256,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Mark an order as cancelled.
    fn mark_cancelled(&self, hash: B256) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Append a confirmed trade.
    fn save_trade(&self, trade: &Trade) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Trades of the market, most recent first.
    fn trades(&self, market: &Market)
    -> impl Future<Output = Result<Vec<Trade>, StoreError>> + Send;
}
