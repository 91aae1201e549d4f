use alloy::primitives::{Address, U256};
use fastnum::UD256;

use super::Token;

/// Wallet and exchange balances of a user for one token, as raw amounts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Balance {
    token: Token,
    user: Address,
    wallet: U256,
    exchange: U256,
}

impl Balance {
    pub fn new(token: Token, user: Address, wallet: U256, exchange: U256) -> Self {
        Self {
            token,
            user,
            wallet,
            exchange,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn user(&self) -> Address {
        self.user
    }

    /// Amount held in the user's wallet, outside of the exchange.
    pub fn wallet(&self) -> U256 {
        self.wallet
    }

    /// Amount custodied by the exchange contract and available for trading.
    pub fn exchange(&self) -> U256 {
        self.exchange
    }

    pub fn wallet_decimal(&self) -> UD256 {
        self.token.converter().from_unsigned(self.wallet)
    }

    pub fn exchange_decimal(&self) -> UD256 {
        self.token.converter().from_unsigned(self.exchange)
    }
}
