use std::cmp::Ordering;

use alloy::primitives::Address;
use fastnum::UD128;

use crate::{
    order,
    store::OrderRecord,
    types::{Market, OrderView, Side},
};

/// Resting order eligible for matching, with its remaining amounts.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub record: OrderRecord,
    pub view: OrderView,
}

/// Resting orders a new order on `side` with limit `price` can trade
/// against, best price first.
///
/// A buy crosses sells priced at or below the limit, sorted ascending; a
/// sell crosses buys priced at or above the limit, sorted descending.
/// Orders of `taker` itself and orders whose signature does not verify
/// against `exchange` are never selected. Equal prices keep input order.
pub fn select_candidates(
    market: &Market,
    exchange: Address,
    side: Side,
    price: UD128,
    taker: Address,
    records: impl IntoIterator<Item = OrderRecord>,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = records
        .into_iter()
        .filter(|r| r.is_open() && r.order.user() != taker)
        .filter(|r| order::verify(&r.order, exchange).is_ok())
        .filter_map(|record| {
            let view = record.order.view_remaining(market, record.amount_filled)?;
            if view.side != side.opposite() {
                return None;
            }
            let crosses = match side {
                Side::Buy => view.price <= price,
                Side::Sell => view.price >= price,
            };
            crosses.then_some(Candidate { record, view })
        })
        .collect();

    candidates.sort_by(|a, b| {
        let ord = a.view.price.partial_cmp(&b.view.price).unwrap_or(Ordering::Equal);
        match side {
            Side::Buy => ord,
            Side::Sell => ord.reverse(),
        }
    });
    candidates
}
