use std::io::{Read, Write};

use alloy::primitives::{B256, TxHash, U256};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{OrderRecord, OrderStore, StoreError};
use crate::types::{Market, Order, Trade};

/// In-process [`OrderStore`] backed by concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: DashMap<B256, OrderRecord>,
    trades: DashMap<TxHash, Trade>,
}

/// Serializable content of a [`MemoryStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub orders: Vec<OrderRecord>,
    pub trades: Vec<Trade>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        for record in snapshot.orders {
            store.orders.insert(record.order.hash(), record);
        }
        for trade in snapshot.trades {
            store.trades.insert(trade.tx_hash, trade);
        }
        store
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            orders: self.orders.iter().map(|r| r.value().clone()).collect(),
            trades: self.trades.iter().map(|t| t.value().clone()).collect(),
        }
    }

    pub fn load_json<R: Read>(reader: R) -> Result<Self, StoreError> {
        Ok(Self::from_snapshot(serde_json::from_reader(reader)?))
    }

    pub fn save_json<W: Write>(&self, writer: W) -> Result<(), StoreError> {
        Ok(serde_json::to_writer_pretty(writer, &self.snapshot())?)
    }

    pub fn get(&self, hash: &B256) -> Option<OrderRecord> {
        self.orders.get(hash).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl OrderStore for MemoryStore {
    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders
            .insert(order.hash(), OrderRecord::new(order.clone()));
        Ok(())
    }

    async fn active_orders(&self, market: &Market) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self
            .orders
            .iter()
            .filter(|r| r.is_open() && r.order.view(market).is_some())
            .map(|r| r.value().clone())
            .collect())
    }

    async fn set_amount_filled(&self, hash: B256, amount_filled: U256) -> Result<(), StoreError> {
        let mut record = self
            .orders
            .get_mut(&hash)
            .ok_or(StoreError::OrderNotFound(hash))?;
        record.amount_filled = amount_filled;
        if record.remaining_get().is_zero() {
            record.is_active = false;
        }
        Ok(())
    }

    async fn mark_cancelled(&self, hash: B256) -> Result<(), StoreError> {
        let mut record = self
            .orders
            .get_mut(&hash)
            .ok_or(StoreError::OrderNotFound(hash))?;
        record.is_cancelled = true;
        record.is_active = false;
        Ok(())
    }

    async fn save_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        self.trades.insert(trade.tx_hash, trade.clone());
        Ok(())
    }

    async fn trades(&self, market: &Market) -> Result<Vec<Trade>, StoreError> {
        let mut trades: Vec<Trade> = self
            .trades
            .iter()
            .filter(|t| {
                market
                    .view(t.token_get, t.amount_get, t.token_give, t.amount_give)
                    .is_some()
            })
            .map(|t| t.value().clone())
            .collect();
        trades.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;
    use crate::testing::{OrderBuilder, test_market};

    #[tokio::test]
    async fn test_fill_deactivates_order() {
        let market = test_market();
        let store = MemoryStore::new();
        let order = OrderBuilder::sell(&market, "0.001", "10").build();
        store.save_order(&order).await.unwrap();
        assert_eq!(store.active_orders(&market).await.unwrap().len(), 1);

        store
            .set_amount_filled(order.hash(), order.amount_get() / U256::from(2))
            .await
            .unwrap();
        assert_eq!(store.active_orders(&market).await.unwrap().len(), 1);

        store
            .set_amount_filled(order.hash(), order.amount_get())
            .await
            .unwrap();
        assert!(store.active_orders(&market).await.unwrap().is_empty());
        assert!(!store.get(&order.hash()).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_cancelled_order_is_not_active() {
        let market = test_market();
        let store = MemoryStore::new();
        let order = OrderBuilder::buy(&market, "0.001", "1").build();
        store.save_order(&order).await.unwrap();
        store.mark_cancelled(order.hash()).await.unwrap();

        assert!(store.active_orders(&market).await.unwrap().is_empty());
        assert!(store.get(&order.hash()).unwrap().is_cancelled);
    }

    #[tokio::test]
    async fn test_unknown_order_update_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.mark_cancelled(B256::ZERO).await,
            Err(StoreError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_other_market_orders_are_filtered() {
        let market = test_market();
        let other = Market::native(crate::types::Token::new(Address::repeat_byte(9), "OTH", 18));
        let store = MemoryStore::new();
        store
            .save_order(&OrderBuilder::sell(&other, "1", "1").build())
            .await
            .unwrap();
        assert!(store.active_orders(&market).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_round_trip_preserves_flags() {
        let market = test_market();
        let store = MemoryStore::new();
        let order = OrderBuilder::sell(&market, "0.002", "3").build();
        store.save_order(&order).await.unwrap();
        store.mark_cancelled(order.hash()).await.unwrap();

        let mut buf = Vec::new();
        store.save_json(&mut buf).unwrap();
        let restored = MemoryStore::load_json(buf.as_slice()).unwrap();
        assert_eq!(restored.get(&order.hash()), store.get(&order.hash()));
    }
}
