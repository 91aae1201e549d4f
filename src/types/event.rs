use alloy::primitives::TxHash;

/// Events decoded from a specific block.
#[derive(Debug)]
pub struct BlockEvents<T> {
    instant: super::StateInstant,
    events: Vec<T>,
}

/// Event along with its transaction context.
#[derive(Debug, Clone)]
pub struct EventContext<T> {
    pub(crate) tx_hash: TxHash,
    pub(crate) tx_index: u64,
    pub(crate) log_index: u64,
    pub(crate) event: T,
}

impl<T> BlockEvents<T> {
    pub(crate) fn new(instant: super::StateInstant, events: Vec<T>) -> Self {
        Self { instant, events }
    }

    /// Instant the events were produced at.
    pub fn instant(&self) -> super::StateInstant {
        self.instant
    }

    /// Raw exchange events in log order.
    pub fn events(&self) -> &[T] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<T> EventContext<T> {
    pub fn new(tx_hash: TxHash, tx_index: u64, log_index: u64, event: T) -> Self {
        Self {
            tx_hash,
            tx_index,
            log_index,
            event,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn tx_index(&self) -> u64 {
        self.tx_index
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    pub fn event(&self) -> &T {
        &self.event
    }
}
