use std::time::{SystemTime, UNIX_EPOCH};

use alloy::{
    primitives::{Address, U256},
    signers::Signer,
};
use fastnum::UD128;
use tracing::{debug, info, warn};

use super::{
    outcome::{Fill, MatchOutcome, SkipReason, Skipped},
    select::{Candidate, select_candidates},
};
use crate::{
    Chain,
    error::DexError,
    num,
    order::{self, OrderError},
    store::OrderStore,
    types::{Market, Order, Side, Trade},
    venue::Venue,
};

/// Default lifetime of a posted resting order, in blocks.
pub const DEFAULT_EXPIRY_BLOCKS: u64 = 10_000;

/// Fee rates are fractions scaled by 1e18.
const FEE_SCALE: u64 = 1_000_000_000_000_000_000;

/// New order to match: buy or sell `amount` base (raw) at limit `price`.
#[derive(Clone, Copy, derive_more::Debug, PartialEq, Eq)]
pub struct MatchRequest {
    pub side: Side,
    #[debug("{price}")]
    pub price: UD128,
    pub amount: U256,
}

impl MatchRequest {
    pub fn new(side: Side, price: UD128, amount: U256) -> Self {
        Self {
            side,
            price,
            amount,
        }
    }

    /// Request with the base amount given as a decimal number of tokens.
    pub fn from_decimal(market: &Market, side: Side, price: UD128, amount: UD128) -> Self {
        Self::new(side, price, market.base().converter().to_unsigned(amount))
    }
}

/// Taker behavior settings.
#[derive(Clone, Copy, Debug)]
pub struct TakerConfig {
    /// Lifetime of a posted resting order, in blocks.
    pub expiry_blocks: u64,
    /// Post the unmatched remainder as a resting order.
    pub post_remainder: bool,
}

impl Default for TakerConfig {
    fn default() -> Self {
        Self {
            expiry_blocks: DEFAULT_EXPIRY_BLOCKS,
            post_remainder: true,
        }
    }
}

/// Executes new orders of one user within one market.
pub struct Taker<'a, V, St, S> {
    chain: &'a Chain,
    market: Market,
    venue: &'a V,
    store: &'a St,
    signer: &'a S,
    config: TakerConfig,
}

impl<'a, V, St, S> Taker<'a, V, St, S>
where
    V: Venue,
    St: OrderStore,
    S: Signer + Send + Sync,
{
    pub fn new(chain: &'a Chain, market: Market, venue: &'a V, store: &'a St, signer: &'a S) -> Self {
        Self {
            chain,
            market,
            venue,
            store,
            signer,
            config: TakerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TakerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    /// Address trades are executed and orders are signed by.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Matches `request` against resting orders, then posts the remainder.
    ///
    /// Only local validation failures and failures to read the current
    /// block or fee are returned as errors. Everything else is reported in
    /// the outcome: per-candidate validation failures are skipped and the
    /// walk continues, a failed trade transaction stops the walk without
    /// posting a remainder.
    pub async fn execute(&self, request: &MatchRequest) -> Result<MatchOutcome, DexError> {
        if request.amount.is_zero() || request.price == UD128::ZERO {
            return Err(OrderError::ZeroAmount.into());
        }
        let taker = self.address();

        let records = match self.store.active_orders(&self.market).await {
            Ok(records) => records,
            Err(e) => {
                warn!(%e, "Failed to load resting orders, matching against an empty book");
                vec![]
            }
        };
        let candidates = select_candidates(
            &self.market,
            self.chain.exchange(),
            request.side,
            request.price,
            taker,
            records,
        );
        debug!(
            side = ?request.side,
            price = %request.price,
            amount = %request.amount,
            candidates = candidates.len(),
            "Matching new order"
        );

        let block = self.venue.block_number().await?;
        let fee_take = self.venue.fee_take().await?;

        let mut outcome = MatchOutcome {
            remaining: request.amount,
            ..Default::default()
        };
        for candidate in candidates {
            if outcome.remaining.is_zero() {
                break;
            }
            let order_hash = candidate.record.order.hash();
            let plan = match self
                .check(&candidate, outcome.remaining, block, fee_take, taker)
                .await
            {
                Ok(plan) => plan,
                Err(reason) => {
                    debug!(%order_hash, %reason, "Skipping resting order");
                    outcome.skipped.push(Skipped { order_hash, reason });
                    continue;
                }
            };

            match self.venue.trade(&candidate.record.order, plan.amount).await {
                Ok(receipt) => {
                    info!(
                        %order_hash,
                        tx_hash = %receipt.tx_hash,
                        amount = %plan.amount,
                        price = %candidate.view.price,
                        "Trade executed"
                    );
                    let trade = self
                        .record_trade(&candidate, plan.amount, receipt, taker)
                        .await;
                    outcome.remaining = outcome.remaining.saturating_sub(plan.base_amount);
                    outcome.fills.push(Fill {
                        order_hash,
                        maker: candidate.record.order.user(),
                        price: candidate.view.price,
                        base_amount: plan.base_amount,
                        amount: plan.amount,
                        tx_hash: receipt.tx_hash,
                        trade,
                    });
                }
                Err(e) => {
                    warn!(%order_hash, %e, "Trade failed, stopping");
                    outcome.stopped = Some(e.reason());
                    return Ok(outcome);
                }
            }
        }

        if !outcome.remaining.is_zero() && self.config.post_remainder {
            match self
                .post_resting(request.side, request.price, outcome.remaining, block)
                .await
            {
                Ok(order) => {
                    info!(order_hash = %order.hash(), amount = %outcome.remaining, "Posted resting order");
                    outcome.resting = Some(order);
                    outcome.remaining = U256::ZERO;
                }
                Err(reason) => {
                    warn!(%reason, "Remainder was not posted");
                    outcome.stopped = Some(reason);
                }
            }
        }
        Ok(outcome)
    }

    /// Validates a candidate against live state and sizes the trade.
    async fn check(
        &self,
        candidate: &Candidate,
        remaining: U256,
        block: u64,
        fee_take: U256,
        taker: Address,
    ) -> Result<TradePlan, SkipReason> {
        let order = &candidate.record.order;
        if order.is_expired(block) {
            return Err(SkipReason::Expired {
                expires: order.expires(),
                block,
            });
        }

        let available = self
            .venue
            .available_volume(order)
            .await
            .map_err(|e| SkipReason::Venue(e.reason()))?;
        if available.is_zero() {
            return Err(SkipReason::Unavailable);
        }

        let plan = TradePlan::size(order, candidate.view.side, available, remaining);
        if plan.amount.is_zero() || plan.base_amount.is_zero() {
            return Err(SkipReason::TooSmall);
        }

        let required = plan.amount + num::mul_div(plan.amount, fee_take, U256::from(FEE_SCALE));
        let balance = self
            .venue
            .balance_of(order.token_get(), taker)
            .await
            .map_err(|e| SkipReason::Venue(e.reason()))?;
        if balance < required {
            return Err(SkipReason::InsufficientBalance {
                required,
                available: balance,
            });
        }

        let ok = self
            .venue
            .test_trade(order, plan.amount, taker)
            .await
            .map_err(|e| SkipReason::Venue(e.reason()))?;
        if !ok {
            return Err(SkipReason::TestTradeFailed);
        }
        Ok(plan)
    }

    /// Persists the confirmed trade and the order's filled amount as read
    /// back from the exchange. Store failures are logged only.
    async fn record_trade(
        &self,
        candidate: &Candidate,
        amount: U256,
        receipt: crate::venue::TradeReceipt,
        taker: Address,
    ) -> Option<Trade> {
        let order = &candidate.record.order;
        let trade = Trade::new(
            &self.market,
            receipt.tx_hash,
            receipt.instant,
            order.user(),
            taker,
            order.token_get(),
            amount,
            order.token_give(),
            num::mul_div(amount, order.amount_give(), order.amount_get()),
        );
        if let Some(trade) = &trade {
            if let Err(e) = self.store.save_trade(trade).await {
                warn!(%e, tx_hash = %receipt.tx_hash, "Failed to save trade");
            }
        }
        let filled = match self.venue.amount_filled(order).await {
            Ok(filled) => filled,
            Err(e) => {
                let filled = candidate.record.amount_filled + amount;
                warn!(
                    %e,
                    order_hash = %order.hash(),
                    %filled,
                    "Failed to read filled amount, using local sum"
                );
                filled
            }
        };
        if let Err(e) = self.store.set_amount_filled(order.hash(), filled).await {
            warn!(%e, order_hash = %order.hash(), "Failed to update filled amount");
        }
        trade
    }

    /// Builds, signs, verifies and stores a resting order for `amount` base.
    async fn post_resting(
        &self,
        side: Side,
        price: UD128,
        amount: U256,
        block: u64,
    ) -> Result<Order, String> {
        let order = self
            .build_order(side, price, amount, block)
            .map_err(|e| e.to_string())?;
        let order = order::sign(order, self.signer)
            .await
            .map_err(|e| e.to_string())?;
        order::verify(&order, self.chain.exchange()).map_err(|e| e.to_string())?;
        self.store
            .save_order(&order)
            .await
            .map_err(|e| format!("failed to save order: {e}"))?;
        Ok(order)
    }

    /// Unsigned resting order for `amount` base at `price`.
    pub fn build_order(
        &self,
        side: Side,
        price: UD128,
        amount: U256,
        block: u64,
    ) -> Result<Order, OrderError> {
        let (token_get, token_give) = self.market.tokens_for(side);
        let quote = self
            .market
            .quote_for(amount, price)
            .ok_or(OrderError::AmountOutOfRange(amount))?;
        let (amount_get, amount_give) = match side {
            Side::Buy => (amount, quote),
            Side::Sell => (quote, amount),
        };
        order::validate_amounts(amount_get, amount_give)?;
        Ok(Order::new(
            self.chain.exchange(),
            token_get,
            amount_get,
            token_give,
            amount_give,
            block + self.config.expiry_blocks,
            nonce(),
            self.address(),
        ))
    }
}

/// Sized trade against one candidate.
#[derive(Clone, Copy, Debug)]
struct TradePlan {
    /// Amount in the maker's `token_get`.
    amount: U256,
    /// Base amount exchanged.
    base_amount: U256,
}

impl TradePlan {
    /// Trades as much of `remaining` base as `available` (in the maker's
    /// `token_get`) allows.
    fn size(order: &Order, maker_side: Side, available: U256, remaining: U256) -> Self {
        match maker_side {
            // Maker gets base
            Side::Buy => {
                let amount = available.min(remaining);
                Self {
                    amount,
                    base_amount: amount,
                }
            }
            // Maker gets quote, gives base
            Side::Sell => {
                let available_base =
                    num::mul_div(available, order.amount_give(), order.amount_get());
                let base = available_base.min(remaining);
                let amount = num::mul_div(base, order.amount_get(), order.amount_give());
                Self {
                    amount,
                    base_amount: num::mul_div(amount, order.amount_give(), order.amount_get()),
                }
            }
        }
    }
}

fn nonce() -> U256 {
    U256::from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default(),
    )
}
