use tokio::sync::mpsc;

use crate::types;

/// Trades of a market from a single block.
#[derive(Clone, Debug)]
pub struct BlockTrades {
    /// Block instant.
    pub instant: types::StateInstant,

    /// Trades in log order.
    pub trades: Vec<types::Trade>,
}

impl BlockTrades {
    pub(crate) fn new(instant: types::StateInstant, trades: Vec<types::Trade>) -> Self {
        Self { instant, trades }
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }
}

/// Receiver for block trades.
pub struct TradeReceiver {
    inner: mpsc::Receiver<BlockTrades>,
}

impl TradeReceiver {
    pub(crate) fn new(inner: mpsc::Receiver<BlockTrades>) -> Self {
        Self { inner }
    }

    /// Receives the next batch of trades, or `None` if the listener stopped.
    pub async fn recv(&mut self) -> Option<BlockTrades> {
        self.inner.recv().await
    }
}
