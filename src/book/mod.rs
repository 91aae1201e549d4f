//! Price-aggregated view of resting orders.

mod level;

pub use level::Level;

use std::{cmp::Reverse, collections::BTreeMap};

use alloy::primitives::{Address, U256};
use fastnum::UD128;

use crate::{
    order,
    store::OrderRecord,
    types::{Market, Side},
};

/// Two-sided book of resting orders of a market, aggregated by price.
///
/// Only orders with a valid signature for the exchange, not expired and
/// with a remaining amount are included.
#[derive(Clone, Debug, Default)]
pub struct Book {
    asks: BTreeMap<UD128, Level>,
    bids: BTreeMap<Reverse<UD128>, Level>,
}

impl Book {
    /// Aggregates open `records` of `market` that are still valid at `block_number`.
    pub fn from_records<'a>(
        market: &Market,
        exchange: Address,
        records: impl IntoIterator<Item = &'a OrderRecord>,
        block_number: u64,
    ) -> Self {
        let mut book = Self::default();
        for record in records {
            if !record.is_open()
                || record.order.is_expired(block_number)
                || order::verify(&record.order, exchange).is_err()
            {
                continue;
            }
            let Some(view) = record.order.view_remaining(market, record.amount_filled) else {
                continue;
            };
            let level = match view.side {
                Side::Sell => book
                    .asks
                    .entry(view.price)
                    .or_insert_with(|| Level::new(view.price)),
                Side::Buy => book
                    .bids
                    .entry(Reverse(view.price))
                    .or_insert_with(|| Level::new(view.price)),
            };
            level.add(record.order.hash(), view.base_amount, view.quote_amount);
        }
        book
    }

    /// Asks sorted away from the spread.
    pub fn asks(&self) -> impl Iterator<Item = &Level> {
        self.asks.values()
    }

    /// Bids sorted away from the spread.
    pub fn bids(&self) -> impl Iterator<Item = &Level> {
        self.bids.values()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first_key_value().map(|(_, v)| v)
    }

    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first_key_value().map(|(_, v)| v)
    }

    pub fn ask_level(&self, price: UD128) -> Option<&Level> {
        self.asks.get(&price)
    }

    pub fn bid_level(&self, price: UD128) -> Option<&Level> {
        self.bids.get(&Reverse(price))
    }

    /// Spread between best ask and best bid, if both sides are present
    /// and not crossed.
    pub fn spread(&self) -> Option<UD128> {
        let ask = self.best_ask()?.price();
        let bid = self.best_bid()?.price();
        (ask >= bid).then(|| ask - bid)
    }

    /// Total base amount resting on a side.
    pub fn depth(&self, side: Side) -> U256 {
        let levels: Box<dyn Iterator<Item = &Level>> = match side {
            Side::Sell => Box::new(self.asks.values()),
            Side::Buy => Box::new(self.bids.values()),
        };
        levels.fold(U256::ZERO, |acc, level| acc + level.base_amount())
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

/// Open orders of `user` within `records`, for display of own orders.
pub fn orders_of<'a>(
    records: impl IntoIterator<Item = &'a OrderRecord>,
    user: Address,
) -> impl Iterator<Item = &'a OrderRecord> {
    records
        .into_iter()
        .filter(move |r| r.order.user() == user && r.is_open())
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;
    use crate::testing::{OrderBuilder, TEST_EXCHANGE, test_market, wei};

    fn record(order: crate::types::Order) -> OrderRecord {
        OrderRecord::new(order)
    }

    #[test]
    fn test_aggregates_by_price() {
        let market = test_market();
        let records = vec![
            record(OrderBuilder::sell(&market, "0.001", "10").build()),
            record(OrderBuilder::sell(&market, "0.001", "5").build()),
            record(OrderBuilder::sell(&market, "0.0012", "1").build()),
            record(OrderBuilder::buy(&market, "0.0009", "2").build()),
            record(OrderBuilder::buy(&market, "0.0008", "3").build()),
        ];
        let book = Book::from_records(&market, TEST_EXCHANGE, &records, 1);

        let best_ask = book.best_ask().unwrap();
        assert_eq!(best_ask.price(), udec128!(0.001));
        assert_eq!(best_ask.base_amount(), wei("15"));
        assert_eq!(best_ask.num_orders(), 2);

        let best_bid = book.best_bid().unwrap();
        assert_eq!(best_bid.price(), udec128!(0.0009));
        assert_eq!(best_bid.base_amount(), wei("2"));

        let ask_prices: Vec<_> = book.asks().map(Level::price).collect();
        assert_eq!(ask_prices, vec![udec128!(0.001), udec128!(0.0012)]);
        let bid_prices: Vec<_> = book.bids().map(Level::price).collect();
        assert_eq!(bid_prices, vec![udec128!(0.0009), udec128!(0.0008)]);

        assert_eq!(book.spread(), Some(udec128!(0.0001)));
        assert_eq!(book.depth(Side::Buy), wei("5"));
    }

    #[test]
    fn test_skips_unsigned_expired_and_filled() {
        let market = test_market();
        let mut filled = record(OrderBuilder::sell(&market, "0.001", "1").build());
        filled.amount_filled = filled.order.amount_get();
        let records = vec![
            record(OrderBuilder::sell(&market, "0.001", "1").unsigned().build()),
            record(OrderBuilder::sell(&market, "0.001", "1").expires(10).build()),
            filled,
        ];
        let book = Book::from_records(&market, TEST_EXCHANGE, &records, 10);
        assert!(book.is_empty());
    }

    #[test]
    fn test_skips_orders_signed_for_another_exchange() {
        let market = test_market();
        let records = vec![
            record(
                OrderBuilder::sell(&market, "0.001", "1")
                    .exchange(Address::repeat_byte(7))
                    .build(),
            ),
            record(OrderBuilder::buy(&market, "0.0009", "1").build()),
        ];
        let book = Book::from_records(&market, TEST_EXCHANGE, &records, 1);
        assert!(book.best_ask().is_none());
        assert_eq!(book.best_bid().unwrap().price(), udec128!(0.0009));
    }

    #[test]
    fn test_skips_orders_too_large_to_price() {
        let market = test_market();
        let records = vec![
            record(
                OrderBuilder::sell(&market, "0.001", "1")
                    .raw_amounts(U256::from(1) << 200, wei("1"))
                    .build(),
            ),
            record(OrderBuilder::sell(&market, "0.001", "2").build()),
        ];
        let book = Book::from_records(&market, TEST_EXCHANGE, &records, 1);
        assert_eq!(book.asks().count(), 1);
        assert_eq!(book.depth(Side::Sell), wei("2"));
    }

    #[test]
    fn test_partially_filled_order_shows_remaining() {
        let market = test_market();
        let mut partial = record(OrderBuilder::buy(&market, "0.001", "10").build());
        partial.amount_filled = wei("4");
        let book = Book::from_records(&market, TEST_EXCHANGE, std::slice::from_ref(&partial), 1);
        assert_eq!(book.bid_level(udec128!(0.001)).unwrap().base_amount(), wei("6"));
    }

    #[test]
    fn test_orders_of_user() {
        let market = test_market();
        let mine = OrderBuilder::sell(&market, "0.001", "1").build();
        let user = mine.user();
        let records = vec![
            record(mine),
            record(OrderBuilder::sell(&market, "0.001", "1").build()),
        ];
        assert_eq!(orders_of(&records, user).count(), 1);
    }
}
