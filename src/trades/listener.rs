use std::{future::Future, time::Duration};

use alloy::providers::Provider;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::debug;

use super::types::{BlockTrades, TradeReceiver};
use crate::{
    Chain,
    abi::exchange::Exchange::{ExchangeEvents, Trade as TradeEvent},
    error::DexError,
    stream,
    types::{Market, StateInstant, Trade},
};

/// Default channel buffer size.
const DEFAULT_CHANNEL_SIZE: usize = 100;

/// Trade processor - pure logic, no async.
#[derive(Clone, Debug)]
pub struct TradeProcessor {
    market: Market,
}

impl TradeProcessor {
    pub fn new(market: Market) -> Self {
        Self { market }
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    /// Extracts the market's trades from a block of raw events.
    ///
    /// Trades of other token pairs are ignored, as are trades whose amounts
    /// are too large to price.
    pub fn process_block(&self, events: &stream::RawBlockEvents) -> BlockTrades {
        let trades = events
            .events()
            .iter()
            .filter_map(|event| match event.event() {
                ExchangeEvents::Trade(e) => self.trade(event.tx_hash(), events.instant(), e),
                _ => None,
            })
            .collect();
        BlockTrades::new(events.instant(), trades)
    }

    fn trade(
        &self,
        tx_hash: alloy::primitives::TxHash,
        instant: StateInstant,
        e: &TradeEvent,
    ) -> Option<Trade> {
        // `get` is the maker receiving `amountGet`, `give` is the taker
        Trade::new(
            &self.market,
            tx_hash,
            instant,
            e.get,
            e.give,
            e.tokenGet,
            e.amountGet,
            e.tokenGive,
            e.amountGive,
        )
    }
}

/// Start the trade listener.
///
/// Returns a receiver for trades and a handle to the background task.
/// The listener streams exchange events starting from the specified block,
/// extracts trades of `market` and pushes them to the channel, one batch
/// per block, including empty ones.
pub fn start<P, S, SFut>(
    chain: &Chain,
    market: Market,
    provider: P,
    from: StateInstant,
    sleep: S,
) -> (TradeReceiver, tokio::task::JoinHandle<Result<(), DexError>>)
where
    P: Provider + Send + 'static,
    S: Fn(Duration) -> SFut + Copy + Send + 'static,
    SFut: Future<Output = ()> + Send,
{
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let chain = chain.clone();
    let processor = TradeProcessor::new(market);
    let handle =
        tokio::spawn(async move { run_listener(chain, provider, from, sleep, processor, tx).await });

    (TradeReceiver::new(rx), handle)
}

async fn run_listener<P, S, SFut>(
    chain: Chain,
    provider: P,
    from: StateInstant,
    sleep: S,
    processor: TradeProcessor,
    tx: mpsc::Sender<BlockTrades>,
) -> Result<(), DexError>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let raw_stream = stream::raw(&chain, provider, from, sleep);
    futures::pin_mut!(raw_stream);

    while let Some(result) = raw_stream.next().await {
        let block_events = result?;
        let block_trades = processor.process_block(&block_events);
        if !block_trades.is_empty() {
            debug!(
                block = block_trades.instant.block_number(),
                trades = block_trades.len(),
                "trades observed"
            );
        }

        if tx.send(block_trades).await.is_err() {
            // Receiver dropped, graceful shutdown
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, B256, U256, address};
    use fastnum::udec128;

    use super::*;
    use crate::{
        abi::exchange::Exchange::Deposit,
        stream::{RawBlockEvents, RawEvent},
        testing::{TEST_TOKEN, test_market, wei},
        types::Side,
    };

    const MAKER: Address = address!("0x00000000000000000000000000000000000000aa");
    const TAKER: Address = address!("0x00000000000000000000000000000000000000bb");

    fn trade_event(
        token_get: Address,
        amount_get: U256,
        token_give: Address,
        amount_give: U256,
    ) -> ExchangeEvents {
        ExchangeEvents::Trade(TradeEvent {
            tokenGet: token_get,
            amountGet: amount_get,
            tokenGive: token_give,
            amountGive: amount_give,
            get: MAKER,
            give: TAKER,
        })
    }

    fn block(events: Vec<ExchangeEvents>) -> RawBlockEvents {
        RawBlockEvents::new(
            StateInstant::new(42, 1_700_000_042),
            events
                .into_iter()
                .enumerate()
                .map(|(i, e)| RawEvent::new(B256::with_last_byte(i as u8 + 1), 0, i as u64, e))
                .collect(),
        )
    }

    #[test]
    fn test_taker_buys_from_selling_maker() {
        let processor = TradeProcessor::new(test_market());
        // maker sold 2 TKN for 0.002 ETH
        let trades = processor.process_block(&block(vec![trade_event(
            Address::ZERO,
            wei("0.002"),
            TEST_TOKEN,
            wei("2"),
        )]));

        assert_eq!(trades.instant.block_number(), 42);
        assert_eq!(trades.len(), 1);
        let trade = &trades.trades[0];
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.price, udec128!(0.001));
        assert_eq!(trade.base_amount, wei("2"));
        assert_eq!(trade.maker, MAKER);
        assert_eq!(trade.taker, TAKER);
        assert_eq!(trade.timestamp, 1_700_000_042);
    }

    #[test]
    fn test_taker_sells_to_buying_maker() {
        let processor = TradeProcessor::new(test_market());
        let trades = processor.process_block(&block(vec![trade_event(
            TEST_TOKEN,
            wei("4"),
            Address::ZERO,
            wei("0.002"),
        )]));

        let trade = &trades.trades[0];
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.price, udec128!(0.0005));
        assert_eq!(trade.quote_amount, wei("0.002"));
    }

    #[test]
    fn test_other_events_and_markets_ignored() {
        let processor = TradeProcessor::new(test_market());
        let other_token = address!("0x2222222222222222222222222222222222222222");
        let trades = processor.process_block(&block(vec![
            ExchangeEvents::Deposit(Deposit {
                token: Address::ZERO,
                user: TAKER,
                amount: wei("1"),
                balance: wei("1"),
            }),
            trade_event(Address::ZERO, wei("1"), other_token, wei("1")),
            trade_event(Address::ZERO, wei("0.001"), TEST_TOKEN, wei("1")),
        ]));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades.trades[0].tx_hash, B256::with_last_byte(3));
    }

    #[test]
    fn test_trade_too_large_to_price_ignored() {
        let processor = TradeProcessor::new(test_market());
        let trades = processor.process_block(&block(vec![
            trade_event(Address::ZERO, wei("1"), TEST_TOKEN, U256::from(1) << 200),
            trade_event(Address::ZERO, wei("0.001"), TEST_TOKEN, wei("1")),
        ]));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades.trades[0].tx_hash, B256::with_last_byte(2));
        assert_eq!(trades.trades[0].price, udec128!(0.001));
    }

    #[test]
    fn test_empty_block() {
        let processor = TradeProcessor::new(test_market());
        let trades = processor.process_block(&block(vec![]));
        assert!(trades.is_empty());
        assert_eq!(trades.instant.block_number(), 42);
    }
}
