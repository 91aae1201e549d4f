//! EtherDelta-style order book DEX SDK.
//!
//! # Overview
//!
//! Orders are created and signed off-chain, kept in an off-chain
//! [`store::OrderStore`] and settled on-chain by the exchange contract
//! when a taker trades against them.
//!
//! Use [`order::sign`] to produce signed resting orders,
//! [`book::Book`] to aggregate active orders into price levels and
//! [`matching::Taker`] to walk the opposite side of the book greedily
//! and post the unfilled remainder as a new resting order.
//!
//! Executed trades are observed with [`trades::start`], which is built on
//! top of the raw per-block event stream [`stream::raw`].
//!
//! [`rewards`] splits a fee rebate pool between traders, weighting paid
//! fees by a staking tier multiplier.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Order book reads come from the off-chain store only; on-chain `Order`
//!   events are not indexed into the store.
//!
//! * Current version relies on log polling to implement reliably continuous
//!   stream of events.
//!
//! # Testing
//!
//! [`testing`] module provides an in-memory exchange simulation
//! ([`testing::ScriptedVenue`]) and order builders.

pub mod abi;
pub mod book;
pub mod error;
pub mod funds;
pub mod matching;
pub mod num;
pub mod order;
pub mod rewards;
pub mod store;
pub mod stream;
pub mod testing;
pub mod trades;
pub mod types;
pub mod venue;

use alloy::primitives::{Address, address};

/// EtherDelta exchange contract on Ethereum mainnet.
pub const MAINNET_EXCHANGE: Address = address!("0x8d12A197cB00D4747a1fe03395095ce2A5CC6819");

#[derive(Clone, Debug)]
/// Chain the exchange is operating on.
pub struct Chain {
    chain_id: u64,
    exchange: Address,
    deployed_at_block: u64,
}

impl Chain {
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            exchange: MAINNET_EXCHANGE,
            deployed_at_block: 3_154_197,
        }
    }

    pub fn new(chain_id: u64, exchange: Address, deployed_at_block: u64) -> Self {
        Self {
            chain_id,
            exchange,
            deployed_at_block,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn deployed_at_block(&self) -> u64 {
        self.deployed_at_block
    }

    pub fn exchange(&self) -> Address {
        self.exchange
    }
}
