//! Trade listener streaming executed trades of a market.
//!
//! Listens to the exchange `Trade` events, turns the ones belonging to a
//! [`crate::types::Market`] into [`crate::types::Trade`] records and
//! streams them batched per block.
//!
//! # Architecture
//!
//! The module separates pure processing logic from async I/O:
//!
//! - [`TradeProcessor`] - Pure, synchronous trade extraction from raw events
//! - [`start`] - Async entry point that spawns a background listener task
//!
//! # Example
//!
//! ```ignore
//! use delta_sdk::{Chain, trades, types::{Market, StateInstant, Token}};
//!
//! let chain = Chain::mainnet();
//! let market = Market::native(Token::new(token_address, "TKN", 18));
//! let provider = /* setup provider */;
//! let from = StateInstant::new(latest_block, 0);
//!
//! let (mut rx, handle) = trades::start(&chain, market, provider, from, tokio::time::sleep);
//!
//! while let Some(block_trades) = rx.recv().await {
//!     for trade in &block_trades.trades {
//!         println!("{:?} {} @ {} (maker={}, taker={})",
//!             trade.side, trade.base_amount, trade.price, trade.maker, trade.taker);
//!     }
//! }
//!
//! handle.await??;
//! ```

mod listener;
mod types;

pub use listener::{TradeProcessor, start};
pub use types::{BlockTrades, TradeReceiver};
