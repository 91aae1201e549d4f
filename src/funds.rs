//! Moving funds in and out of the exchange, and cancelling orders on-chain.
//!
//! The exchange custodies balances per token under the user's address; the
//! native chain currency is kept under the zero token address.

use std::future::IntoFuture;

use alloy::{
    primitives::{Address, TxHash, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
};
use tracing::{debug, info};

use crate::{
    Chain,
    abi::{erc20::Erc20::Erc20Instance, exchange::Exchange::ExchangeInstance},
    error::DexError,
    order::OrderError,
    types::{Balance, Order, Token},
};

/// Fetches token metadata. The zero address resolves to the native currency.
pub async fn token<P: Provider>(provider: &P, address: Address) -> Result<Token, DexError> {
    if address.is_zero() {
        return Ok(Token::native());
    }
    let instance = Erc20Instance::new(address, provider);
    let (symbol, decimals) = (instance.symbol(), instance.decimals());
    let (symbol, decimals) = futures::try_join!(
        symbol.call().into_future(),
        decimals.call().into_future()
    )?;
    Ok(Token::new(address, symbol, decimals))
}

/// Wallet and exchange balances of `user` in `token`.
pub async fn balance<P: Provider>(
    chain: &Chain,
    provider: &P,
    token: &Token,
    user: Address,
) -> Result<Balance, DexError> {
    let exchange = ExchangeInstance::new(chain.exchange(), provider);
    let on_exchange = exchange.balanceOf(token.address(), user).call().await?;
    let in_wallet = if token.is_native() {
        provider.get_balance(user).await?
    } else {
        Erc20Instance::new(token.address(), provider)
            .balanceOf(user)
            .call()
            .await?
    };
    Ok(Balance::new(token.clone(), user, in_wallet, on_exchange))
}

/// Deposits `amount` of `token` from the `owner`'s wallet to the exchange.
///
/// ERC-20 deposits approve the exchange first when the current allowance
/// is not sufficient. Transactions are sent from the provider's wallet,
/// which is expected to be `owner`.
pub async fn deposit<P: Provider>(
    chain: &Chain,
    provider: &P,
    token: &Token,
    owner: Address,
    amount: U256,
) -> Result<TxHash, DexError> {
    if amount.is_zero() {
        return Err(OrderError::ZeroAmount.into());
    }
    let exchange = ExchangeInstance::new(chain.exchange(), provider);
    let receipt = if token.is_native() {
        exchange
            .deposit()
            .value(amount)
            .send()
            .await?
            .get_receipt()
            .await?
    } else {
        let erc20 = Erc20Instance::new(token.address(), provider);
        let allowance = erc20.allowance(owner, chain.exchange()).call().await?;
        if allowance < amount {
            debug!(token = token.symbol(), %allowance, %amount, "approving exchange");
            let approval = erc20
                .approve(chain.exchange(), amount)
                .send()
                .await?
                .get_receipt()
                .await?;
            confirmed(approval)?;
        }
        exchange
            .depositToken(token.address(), amount)
            .send()
            .await?
            .get_receipt()
            .await?
    };
    let tx_hash = confirmed(receipt)?;
    info!(token = token.symbol(), %amount, %tx_hash, "deposited");
    Ok(tx_hash)
}

/// Withdraws `amount` of `token` from the exchange to the sender's wallet.
pub async fn withdraw<P: Provider>(
    chain: &Chain,
    provider: &P,
    token: &Token,
    amount: U256,
) -> Result<TxHash, DexError> {
    if amount.is_zero() {
        return Err(OrderError::ZeroAmount.into());
    }
    let exchange = ExchangeInstance::new(chain.exchange(), provider);
    let pending = if token.is_native() {
        exchange.withdraw(amount).send().await?
    } else {
        exchange.withdrawToken(token.address(), amount).send().await?
    };
    let receipt = pending.get_receipt().await?;
    let tx_hash = confirmed(receipt)?;
    info!(token = token.symbol(), %amount, %tx_hash, "withdrawn");
    Ok(tx_hash)
}

/// Cancels a signed order on-chain so it can no longer be traded.
///
/// Only the order's maker can cancel it.
pub async fn cancel<P: Provider>(
    chain: &Chain,
    provider: &P,
    order: &Order,
) -> Result<TxHash, DexError> {
    let sig = order.signature().copied().ok_or(OrderError::Unsigned)?;
    let exchange = ExchangeInstance::new(chain.exchange(), provider);
    let receipt = exchange
        .cancelOrder(
            order.token_get(),
            order.amount_get(),
            order.token_give(),
            order.amount_give(),
            U256::from(order.expires()),
            order.nonce(),
            sig.v(),
            sig.r(),
            sig.s(),
        )
        .send()
        .await?
        .get_receipt()
        .await?;
    let tx_hash = confirmed(receipt)?;
    info!(order = %order.hash(), %tx_hash, "order cancelled");
    Ok(tx_hash)
}

fn confirmed(receipt: TransactionReceipt) -> Result<TxHash, DexError> {
    if receipt.status() {
        Ok(receipt.transaction_hash)
    } else {
        Err(DexError::TransactionFailed(receipt.transaction_hash))
    }
}
