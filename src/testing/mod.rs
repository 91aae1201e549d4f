//! In-memory testing environment and test utilities.
//!
//! [`ScriptedVenue`] simulates the exchange contract's balance custody,
//! volume tracking and trade execution closely enough to drive the matching
//! walk without a node. Individual candidates can be made to fail their dry
//! run or their trade transaction.
//!
//! [`OrderBuilder`] produces signed orders in a [`test_market`] from decimal
//! prices and amounts, with a fresh random maker unless one is given.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use alloy::{
    primitives::{Address, B256, U256, address, keccak256},
    signers::{SignerSync, local::PrivateKeySigner},
};
use dashmap::{DashMap, DashSet};
use fastnum::{UD128, decimal::Context};

use crate::{
    Chain,
    error::{DexError, RevertReason},
    num,
    types::{Market, Order, Side, StateInstant, Token},
    venue::{TradeReceipt, Venue},
};

/// Exchange contract address orders are signed for in tests.
pub const TEST_EXCHANGE: Address = address!("0x8d12A197cB00D4747a1fe03395095ce2A5CC6819");

/// Base token of [`test_market`].
pub const TEST_TOKEN: Address = address!("0x1111111111111111111111111111111111111111");

const FEE_SCALE: u64 = 1_000_000_000_000_000_000;

/// 18-decimal token traded against the native currency.
pub fn test_market() -> Market {
    Market::native(Token::new(TEST_TOKEN, "TKN", 18))
}

/// Chain with [`TEST_EXCHANGE`] deployed.
pub fn test_chain() -> Chain {
    Chain::new(1337, TEST_EXCHANGE, 0)
}

/// Raw amount of an 18-decimal token.
pub fn wei(amount: &str) -> U256 {
    num::Converter::new(18).to_unsigned(decimal(amount))
}

/// Decimal from its string form.
pub fn decimal(value: &str) -> UD128 {
    UD128::from_str(value, Context::default()).expect("valid decimal")
}

/// Builder for signed test orders.
///
/// # Example
///
/// ```ignore
/// use delta_sdk::testing::{OrderBuilder, test_market};
///
/// let market = test_market();
/// let ask = OrderBuilder::sell(&market, "0.001", "10").build();
/// let unsigned_bid = OrderBuilder::buy(&market, "0.0009", "5").unsigned().build();
/// ```
#[derive(Clone, Debug)]
pub struct OrderBuilder {
    market: Market,
    side: Side,
    price: UD128,
    amount: UD128,
    exchange: Address,
    expires: u64,
    nonce: U256,
    signer: PrivateKeySigner,
    signed: bool,
    raw: Option<(U256, U256)>,
}

impl OrderBuilder {
    /// Maker buys `amount` base at `price`.
    pub fn buy(market: &Market, price: &str, amount: &str) -> Self {
        Self::new(market, Side::Buy, price, amount)
    }

    /// Maker sells `amount` base at `price`.
    pub fn sell(market: &Market, price: &str, amount: &str) -> Self {
        Self::new(market, Side::Sell, price, amount)
    }

    fn new(market: &Market, side: Side, price: &str, amount: &str) -> Self {
        static NONCE: AtomicU64 = AtomicU64::new(1);
        Self {
            market: market.clone(),
            side,
            price: decimal(price),
            amount: decimal(amount),
            exchange: TEST_EXCHANGE,
            expires: 1_000_000,
            nonce: U256::from(NONCE.fetch_add(1, Ordering::Relaxed)),
            signer: PrivateKeySigner::random(),
            signed: true,
            raw: None,
        }
    }

    /// Maker key, the order's user is its address.
    pub fn signer(mut self, signer: PrivateKeySigner) -> Self {
        self.signer = signer;
        self
    }

    pub fn exchange(mut self, exchange: Address) -> Self {
        self.exchange = exchange;
        self
    }

    pub fn expires(mut self, expires: u64) -> Self {
        self.expires = expires;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = U256::from(nonce);
        self
    }

    /// Raw base and quote amounts, overriding price and amount.
    pub fn raw_amounts(mut self, base: U256, quote: U256) -> Self {
        self.raw = Some((base, quote));
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    pub fn build(self) -> Order {
        let (base, quote) = self.raw.unwrap_or_else(|| {
            let base = self.market.base().converter().to_unsigned(self.amount);
            let quote = self
                .market
                .quote_for(base, self.price)
                .expect("amount in range");
            (base, quote)
        });
        let (token_get, token_give) = self.market.tokens_for(self.side);
        let (amount_get, amount_give) = match self.side {
            Side::Buy => (base, quote),
            Side::Sell => (quote, base),
        };
        let order = Order::new(
            self.exchange,
            token_get,
            amount_get,
            token_give,
            amount_give,
            self.expires,
            self.nonce,
            self.signer.address(),
        );
        if !self.signed {
            return order;
        }
        let signature = self
            .signer
            .sign_message_sync(order.hash().as_slice())
            .expect("signing succeeds");
        order.with_signature(signature.into())
    }
}

/// In-memory simulation of the exchange contract.
#[derive(Debug, Default)]
pub struct ScriptedVenue {
    block: AtomicU64,
    fee_take: U256,
    sender: Address,
    balances: DashMap<(Address, Address), U256>,
    filled: DashMap<B256, U256>,
    cancelled: DashSet<B256>,
    failing_dry_runs: DashSet<B256>,
    failing_trades: DashMap<B256, String>,
    trades: DashMap<u64, (B256, U256)>,
    calls: AtomicUsize,
}

impl ScriptedVenue {
    pub fn new(block: u64) -> Self {
        Self {
            block: AtomicU64::new(block),
            ..Default::default()
        }
    }

    /// Address trade transactions are sent from.
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    /// Taker fee scaled by 1e18, e.g. `3_000_000_000_000_000` for 0.3%.
    pub fn with_fee_take(mut self, fee_take: U256) -> Self {
        self.fee_take = fee_take;
        self
    }

    /// Credits exchange balance.
    pub fn deposit(&self, token: Address, user: Address, amount: U256) {
        *self.balances.entry((token, user)).or_default() += amount;
    }

    pub fn exchange_balance(&self, token: Address, user: Address) -> U256 {
        self.balances
            .get(&(token, user))
            .map(|b| *b)
            .unwrap_or_default()
    }

    pub fn set_block(&self, block: u64) {
        self.block.store(block, Ordering::SeqCst);
    }

    pub fn cancel(&self, order: &Order) {
        self.cancelled.insert(order.hash());
    }

    pub fn fill(&self, order: &Order, amount: U256) {
        *self.filled.entry(order.hash()).or_default() += amount;
    }

    /// Makes the dry run fail for the order.
    pub fn fail_dry_run(&self, order: &Order) {
        self.failing_dry_runs.insert(order.hash());
    }

    /// Makes the trade transaction revert for the order.
    pub fn fail_trade(&self, order: &Order, reason: &str) {
        self.failing_trades.insert(order.hash(), reason.to_string());
    }

    /// Executed trades as `(order hash, amount)` in execution order.
    pub fn executed(&self) -> Vec<(B256, U256)> {
        let mut trades: Vec<_> = self
            .trades
            .iter()
            .map(|t| (*t.key(), *t.value()))
            .collect();
        trades.sort_by_key(|(seq, _)| *seq);
        trades.into_iter().map(|(_, t)| t).collect()
    }

    /// Number of contract calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn volume(&self, order: &Order) -> U256 {
        let block = self.block.load(Ordering::SeqCst);
        if order.is_expired(block) || self.cancelled.contains(&order.hash()) {
            return U256::ZERO;
        }
        let filled = self
            .filled
            .get(&order.hash())
            .map(|f| *f)
            .unwrap_or_default();
        let unfilled = order.amount_get().saturating_sub(filled);
        let funded = num::mul_div(
            self.exchange_balance(order.token_give(), order.user()),
            order.amount_get(),
            order.amount_give(),
        );
        unfilled.min(funded)
    }

    fn fee(&self, amount: U256) -> U256 {
        num::mul_div(amount, self.fee_take, U256::from(FEE_SCALE))
    }

    fn dry_run(&self, order: &Order, amount: U256, sender: Address) -> bool {
        !self.failing_dry_runs.contains(&order.hash())
            && self.exchange_balance(order.token_get(), sender) >= amount
            && self.volume(order) >= amount
    }

    fn debit(&self, token: Address, user: Address, amount: U256) {
        let mut balance = self.balances.entry((token, user)).or_default();
        *balance = balance.saturating_sub(amount);
    }
}

impl Venue for ScriptedVenue {
    async fn block_number(&self) -> Result<u64, DexError> {
        self.touch();
        Ok(self.block.load(Ordering::SeqCst))
    }

    async fn fee_take(&self) -> Result<U256, DexError> {
        self.touch();
        Ok(self.fee_take)
    }

    async fn balance_of(&self, token: Address, user: Address) -> Result<U256, DexError> {
        self.touch();
        Ok(self.exchange_balance(token, user))
    }

    async fn available_volume(&self, order: &Order) -> Result<U256, DexError> {
        self.touch();
        Ok(self.volume(order))
    }

    async fn amount_filled(&self, order: &Order) -> Result<U256, DexError> {
        self.touch();
        Ok(self
            .filled
            .get(&order.hash())
            .map(|f| *f)
            .unwrap_or_default())
    }

    async fn test_trade(
        &self,
        order: &Order,
        amount: U256,
        sender: Address,
    ) -> Result<bool, DexError> {
        self.touch();
        Ok(self.dry_run(order, amount, sender))
    }

    async fn trade(&self, order: &Order, amount: U256) -> Result<TradeReceipt, DexError> {
        self.touch();
        if let Some(reason) = self.failing_trades.get(&order.hash()) {
            return Err(DexError::Reverted(Box::new(RevertReason::Message(
                reason.value().clone(),
            ))));
        }
        let taker = self.sender;
        if !self.dry_run(order, amount, taker) {
            return Err(DexError::Reverted(Box::new(RevertReason::Unknown)));
        }

        let give = num::mul_div(order.amount_give(), amount, order.amount_get());
        self.debit(order.token_get(), taker, amount + self.fee(amount));
        self.deposit(order.token_get(), order.user(), amount);
        self.debit(order.token_give(), order.user(), give);
        self.deposit(order.token_give(), taker, give);
        self.fill(order, amount);

        let seq = self.trades.len() as u64;
        self.trades.insert(seq, (order.hash(), amount));
        let block = self.block.load(Ordering::SeqCst);
        let mut preimage = order.hash().to_vec();
        preimage.extend_from_slice(&seq.to_be_bytes());
        Ok(TradeReceipt {
            tx_hash: keccak256(preimage),
            instant: StateInstant::new(block, 1_700_000_000 + block),
        })
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;
    use crate::order;

    #[test]
    fn test_builder_produces_verifiable_orders() {
        let market = test_market();
        let order = OrderBuilder::sell(&market, "0.001", "10").build();
        assert!(order::verify(&order, TEST_EXCHANGE).is_ok());

        let view = order.view(&market).unwrap();
        assert_eq!(view.side, Side::Sell);
        assert_eq!(view.price, udec128!(0.001));
        assert_eq!(view.base_amount, wei("10"));
        assert_eq!(view.quote_amount, wei("0.01"));
    }

    #[test]
    fn test_builder_unsigned() {
        let order = OrderBuilder::buy(&test_market(), "0.001", "1")
            .unsigned()
            .build();
        assert!(!order.is_signed());
    }

    #[tokio::test]
    async fn test_available_volume_is_limited_by_maker_funds() {
        let market = test_market();
        let venue = ScriptedVenue::new(1);
        let order = OrderBuilder::sell(&market, "0.001", "10").build();
        venue.deposit(TEST_TOKEN, order.user(), wei("4"));

        assert_eq!(venue.available_volume(&order).await.unwrap(), wei("0.004"));

        venue.cancel(&order);
        assert_eq!(venue.available_volume(&order).await.unwrap(), U256::ZERO);
    }

    #[tokio::test]
    async fn test_trade_moves_balances_and_fee() {
        let market = test_market();
        let taker = Address::repeat_byte(0xaa);
        let venue = ScriptedVenue::new(1)
            .with_sender(taker)
            .with_fee_take(U256::from(3_000_000_000_000_000u64));
        let order = OrderBuilder::sell(&market, "0.001", "10").build();
        venue.deposit(TEST_TOKEN, order.user(), wei("10"));
        venue.deposit(Address::ZERO, taker, wei("1"));

        venue.trade(&order, wei("0.005")).await.unwrap();

        assert_eq!(venue.exchange_balance(TEST_TOKEN, taker), wei("5"));
        assert_eq!(venue.exchange_balance(Address::ZERO, order.user()), wei("0.005"));
        assert_eq!(
            venue.exchange_balance(Address::ZERO, taker),
            wei("1") - wei("0.005") - wei("0.000015")
        );
        assert_eq!(venue.amount_filled(&order).await.unwrap(), wei("0.005"));
    }
}
