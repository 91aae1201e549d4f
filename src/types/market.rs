use alloy::primitives::{Address, U256};
use fastnum::UD128;
use serde::{Deserialize, Serialize};

use crate::num;

/// Side of an order from its maker's perspective, or of a trade from
/// its taker's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side of the resting orders this side trades against.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Token known to the client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    address: Address,
    symbol: String,
    decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Native chain currency, held by the exchange under the zero address.
    pub fn native() -> Self {
        Self::new(Address::ZERO, "ETH", 18)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_native(&self) -> bool {
        self.address.is_zero()
    }

    pub fn converter(&self) -> num::Converter {
        num::Converter::new(self.decimals)
    }
}

/// Base/quote token pair. Prices are quoted as `quote` per one `base`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Market {
    base: Token,
    quote: Token,
}

/// Order or trade amounts interpreted within a [`Market`].
#[derive(Clone, Copy, derive_more::Debug, PartialEq, Eq)]
pub struct OrderView {
    pub side: Side,
    #[debug("{price}")]
    pub price: UD128,
    pub base_amount: U256,
    pub quote_amount: U256,
}

impl Market {
    pub fn new(base: Token, quote: Token) -> Self {
        Self { base, quote }
    }

    /// Token traded against the native currency.
    pub fn native(base: Token) -> Self {
        Self::new(base, Token::native())
    }

    pub fn base(&self) -> &Token {
        &self.base
    }

    pub fn quote(&self) -> &Token {
        &self.quote
    }

    /// Interprets a `(token_get, amount_get, token_give, amount_give)` tuple.
    ///
    /// The maker buys base when it gets base and gives quote, and sells base
    /// when it gives base and gets quote. Anything else is not part of the
    /// market and yields `None`, as do a zero base amount and amounts too
    /// large to price.
    pub fn view(
        &self,
        token_get: Address,
        amount_get: U256,
        token_give: Address,
        amount_give: U256,
    ) -> Option<OrderView> {
        let (side, base_amount, quote_amount) =
            if token_get == self.base.address && token_give == self.quote.address {
                (Side::Buy, amount_get, amount_give)
            } else if token_give == self.base.address && token_get == self.quote.address {
                (Side::Sell, amount_give, amount_get)
            } else {
                return None;
            };
        let price = num::price(
            base_amount,
            self.base.converter(),
            quote_amount,
            self.quote.converter(),
        )?;
        Some(OrderView {
            side,
            price,
            base_amount,
            quote_amount,
        })
    }

    /// Token the maker of an order on `side` gets, followed by the token it gives.
    pub fn tokens_for(&self, side: Side) -> (Address, Address) {
        match side {
            Side::Buy => (self.base.address, self.quote.address),
            Side::Sell => (self.quote.address, self.base.address),
        }
    }

    /// Raw quote amount worth `base_amount` at `price`, rounded down.
    ///
    /// Returns `None` when `base_amount` exceeds the range of [`UD128`].
    pub fn quote_for(&self, base_amount: U256, price: UD128) -> Option<U256> {
        let base: UD128 = self.base.converter().try_from_unsigned(base_amount)?;
        Some(self.quote.converter().to_unsigned(base * price))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use fastnum::udec128;

    use super::*;

    fn market() -> Market {
        Market::native(Token::new(
            address!("0x1111111111111111111111111111111111111111"),
            "TKN",
            18,
        ))
    }

    #[test]
    fn test_view_sell_order() {
        let m = market();
        let view = m
            .view(
                Address::ZERO,
                U256::from(1_000_000_000_000_000u64),
                m.base().address(),
                U256::from(1_000_000_000_000_000_000u64),
            )
            .unwrap();
        assert_eq!(view.side, Side::Sell);
        assert_eq!(view.price, udec128!(0.001));
        assert_eq!(view.base_amount, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_view_buy_order() {
        let m = market();
        let view = m
            .view(
                m.base().address(),
                U256::from(2_000_000_000_000_000_000u64),
                Address::ZERO,
                U256::from(1_000_000_000_000_000u64),
            )
            .unwrap();
        assert_eq!(view.side, Side::Buy);
        assert_eq!(view.price, udec128!(0.0005));
        assert_eq!(view.quote_amount, U256::from(1_000_000_000_000_000u64));
    }

    #[test]
    fn test_view_unrelated_order() {
        let m = market();
        let other = address!("0x2222222222222222222222222222222222222222");
        assert!(
            m.view(other, U256::from(1), Address::ZERO, U256::from(1))
                .is_none()
        );
    }

    #[test]
    fn test_quote_for_base_amount() {
        let m = market();
        assert_eq!(
            m.quote_for(U256::from(2_000_000_000_000_000_000u64), udec128!(0.0011)),
            Some(U256::from(2_200_000_000_000_000u64))
        );
        assert_eq!(m.quote_for(U256::from(1) << 200, udec128!(0.0011)), None);
    }

    #[test]
    fn test_view_ignores_amounts_out_of_range() {
        let m = market();
        let large = U256::from(1) << 200;
        assert!(
            m.view(Address::ZERO, U256::from(1), m.base().address(), large)
                .is_none()
        );
        assert!(
            m.view(m.base().address(), U256::from(1), Address::ZERO, large)
                .is_none()
        );
    }
}
