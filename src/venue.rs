//! Live exchange state used while matching.
//!
//! [`Venue`] covers the reads the matching walk validates against and the
//! trade submission itself. [`ContractVenue`] talks to the deployed exchange
//! contract, [`crate::testing::ScriptedVenue`] simulates it in memory.

use std::future::Future;

use alloy::{
    primitives::{Address, TxHash, U256},
    providers::Provider,
};

use crate::{
    Chain,
    abi::exchange::Exchange::ExchangeInstance,
    error::DexError,
    order::OrderError,
    types::{Order, OrderSignature, StateInstant},
};

/// Confirmation of an executed trade transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeReceipt {
    pub tx_hash: TxHash,
    pub instant: StateInstant,
}

/// Exchange contract operations the matching walk depends on.
///
/// All amounts are raw token amounts; trade amounts are denominated in the
/// maker order's `token_get`.
pub trait Venue {
    /// Latest block number.
    fn block_number(&self) -> impl Future<Output = Result<u64, DexError>>;

    /// Taker fee as a fraction scaled by 1e18.
    fn fee_take(&self) -> impl Future<Output = Result<U256, DexError>>;

    /// Exchange balance of `user` in `token`.
    fn balance_of(
        &self,
        token: Address,
        user: Address,
    ) -> impl Future<Output = Result<U256, DexError>>;

    /// Amount of the order's `token_get` that can still be traded.
    fn available_volume(&self, order: &Order) -> impl Future<Output = Result<U256, DexError>>;

    /// Amount of the order's `token_get` already traded.
    fn amount_filled(&self, order: &Order) -> impl Future<Output = Result<U256, DexError>>;

    /// Dry run of a trade of `amount` against the order by `sender`.
    fn test_trade(
        &self,
        order: &Order,
        amount: U256,
        sender: Address,
    ) -> impl Future<Output = Result<bool, DexError>>;

    /// Submits a trade of `amount` against the order and waits for the receipt.
    fn trade(
        &self,
        order: &Order,
        amount: U256,
    ) -> impl Future<Output = Result<TradeReceipt, DexError>>;
}

/// [`Venue`] backed by the deployed exchange contract.
///
/// Transactions are sent from the provider's default wallet.
#[derive(Debug, Clone)]
pub struct ContractVenue<P> {
    instance: ExchangeInstance<P>,
}

impl<P: Provider> ContractVenue<P> {
    pub fn new(chain: &Chain, provider: P) -> Self {
        Self {
            instance: ExchangeInstance::new(chain.exchange(), provider),
        }
    }

    pub fn instance(&self) -> &ExchangeInstance<P> {
        &self.instance
    }
}

fn signature_of(order: &Order) -> Result<OrderSignature, DexError> {
    order
        .signature()
        .copied()
        .ok_or(DexError::Order(OrderError::Unsigned))
}

impl<P: Provider> Venue for ContractVenue<P> {
    async fn block_number(&self) -> Result<u64, DexError> {
        Ok(self.instance.provider().get_block_number().await?)
    }

    async fn fee_take(&self) -> Result<U256, DexError> {
        Ok(self.instance.feeTake().call().await?)
    }

    async fn balance_of(&self, token: Address, user: Address) -> Result<U256, DexError> {
        Ok(self.instance.balanceOf(token, user).call().await?)
    }

    async fn available_volume(&self, order: &Order) -> Result<U256, DexError> {
        let sig = signature_of(order)?;
        Ok(self
            .instance
            .availableVolume(
                order.token_get(),
                order.amount_get(),
                order.token_give(),
                order.amount_give(),
                U256::from(order.expires()),
                order.nonce(),
                order.user(),
                sig.v(),
                sig.r(),
                sig.s(),
            )
            .call()
            .await?)
    }

    async fn amount_filled(&self, order: &Order) -> Result<U256, DexError> {
        let sig = signature_of(order)?;
        Ok(self
            .instance
            .amountFilled(
                order.token_get(),
                order.amount_get(),
                order.token_give(),
                order.amount_give(),
                U256::from(order.expires()),
                order.nonce(),
                order.user(),
                sig.v(),
                sig.r(),
                sig.s(),
            )
            .call()
            .await?)
    }

    async fn test_trade(
        &self,
        order: &Order,
        amount: U256,
        sender: Address,
    ) -> Result<bool, DexError> {
        let sig = signature_of(order)?;
        Ok(self
            .instance
            .testTrade(
                order.token_get(),
                order.amount_get(),
                order.token_give(),
                order.amount_give(),
                U256::from(order.expires()),
                order.nonce(),
                order.user(),
                sig.v(),
                sig.r(),
                sig.s(),
                amount,
                sender,
            )
            .call()
            .await?)
    }

    async fn trade(&self, order: &Order, amount: U256) -> Result<TradeReceipt, DexError> {
        let sig = signature_of(order)?;
        let receipt = self
            .instance
            .trade(
                order.token_get(),
                order.amount_get(),
                order.token_give(),
                order.amount_give(),
                U256::from(order.expires()),
                order.nonce(),
                order.user(),
                sig.v(),
                sig.r(),
                sig.s(),
                amount,
            )
            .send()
            .await?
            .get_receipt()
            .await?;
        if !receipt.status() {
            return Err(DexError::TransactionFailed(receipt.transaction_hash));
        }
        let block_number = receipt.block_number.unwrap_or_default();
        let timestamp = self
            .instance
            .provider()
            .get_block_by_number(block_number.into())
            .await
            .ok()
            .flatten()
            .map(|b| b.header.timestamp)
            .unwrap_or_default();
        Ok(TradeReceipt {
            tx_hash: receipt.transaction_hash,
            instant: StateInstant::new(block_number, timestamp),
        })
    }
}
