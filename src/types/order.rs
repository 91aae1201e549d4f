use alloy::primitives::{Address, B256, Signature, U256};
use serde::{Deserialize, Serialize};

use super::{Market, OrderView, Side};
use crate::{num, order::hash};

/// Personal-message signature over the order hash, in the `(v, r, s)` form
/// the exchange contract expects (`v` is 27 or 28).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSignature {
    v: u8,
    r: B256,
    s: B256,
}

/// Off-chain exchange order.
///
/// The maker offers `amount_give` of `token_give` for `amount_get` of
/// `token_get`, valid up to and excluding block `expires`. The zero address
/// stands for the native currency.
///
/// Side and price are not part of the order, see [`Order::view`].
///
/// The hash is computed once on construction over the exchange contract
/// address and the order parameters, and is what the maker signs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    token_get: Address,
    amount_get: U256,
    token_give: Address,
    amount_give: U256,
    expires: u64,
    nonce: U256,
    user: Address,
    signature: Option<OrderSignature>,
    hash: B256,
}

impl OrderSignature {
    pub fn new(v: u8, r: B256, s: B256) -> Self {
        Self { v, r, s }
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn r(&self) -> B256 {
        self.r
    }

    pub fn s(&self) -> B256 {
        self.s
    }

    /// Signature in the recoverable form used by the signer/recovery APIs.
    ///
    /// Accepts both `{27, 28}` and `{0, 1}` encodings of `v`.
    pub fn to_signature(&self) -> Signature {
        let y_parity = matches!(self.v, 1 | 28);
        Signature::new(U256::from_be_bytes(self.r.0), U256::from_be_bytes(self.s.0), y_parity)
    }
}

impl From<Signature> for OrderSignature {
    fn from(value: Signature) -> Self {
        Self {
            v: 27 + value.v() as u8,
            r: B256::from(value.r().to_be_bytes::<32>()),
            s: B256::from(value.s().to_be_bytes::<32>()),
        }
    }
}

impl Order {
    /// Creates an unsigned order of `user` for the given exchange contract.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exchange: Address,
        token_get: Address,
        amount_get: U256,
        token_give: Address,
        amount_give: U256,
        expires: u64,
        nonce: U256,
        user: Address,
    ) -> Self {
        let hash = hash::order_hash(
            exchange,
            token_get,
            amount_get,
            token_give,
            amount_give,
            expires,
            nonce,
        );
        Self {
            token_get,
            amount_get,
            token_give,
            amount_give,
            expires,
            nonce,
            user,
            signature: None,
            hash,
        }
    }

    /// Attaches the maker's signature.
    ///
    /// The signature is not checked here, see [`crate::order::verify`].
    pub fn with_signature(mut self, signature: OrderSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn token_get(&self) -> Address {
        self.token_get
    }

    pub fn amount_get(&self) -> U256 {
        self.amount_get
    }

    pub fn token_give(&self) -> Address {
        self.token_give
    }

    pub fn amount_give(&self) -> U256 {
        self.amount_give
    }

    /// First block the order is no longer valid at.
    pub fn expires(&self) -> u64 {
        self.expires
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    /// Maker of the order, the only party able to sign it.
    pub fn user(&self) -> Address {
        self.user
    }

    pub fn signature(&self) -> Option<&OrderSignature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn is_expired(&self, block_number: u64) -> bool {
        self.expires <= block_number
    }

    /// Side, price and amounts of the order within `market`.
    pub fn view(&self, market: &Market) -> Option<OrderView> {
        market.view(
            self.token_get,
            self.amount_get,
            self.token_give,
            self.amount_give,
        )
    }

    /// Like [`Self::view`], but with amounts reduced by `amount_filled`,
    /// which is denominated in `token_get` as reported by the exchange.
    ///
    /// Returns `None` for a fully filled order. The price is that of the
    /// original order.
    pub fn view_remaining(&self, market: &Market, amount_filled: U256) -> Option<OrderView> {
        let full = self.view(market)?;
        let remaining_get = self.amount_get.checked_sub(amount_filled)?;
        if remaining_get.is_zero() {
            return None;
        }
        let remaining_give = num::mul_div(remaining_get, self.amount_give, self.amount_get);
        let (base_amount, quote_amount) = match full.side {
            Side::Buy => (remaining_get, remaining_give),
            Side::Sell => (remaining_give, remaining_get),
        };
        Some(OrderView {
            base_amount,
            quote_amount,
            ..full
        })
    }

    /// Recomputes the hash for the given exchange contract.
    pub fn compute_hash(&self, exchange: Address) -> B256 {
        hash::order_hash(
            exchange,
            self.token_get,
            self.amount_get,
            self.token_give,
            self.amount_give,
            self.expires,
            self.nonce,
        )
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    #[test]
    fn test_signature_v_encoding() {
        let sig = OrderSignature::new(
            28,
            b256!("0x0000000000000000000000000000000000000000000000000000000000000001"),
            b256!("0x0000000000000000000000000000000000000000000000000000000000000002"),
        );
        let converted = sig.to_signature();
        assert!(converted.v());
        assert_eq!(converted.r(), U256::from(1));
        assert_eq!(converted.s(), U256::from(2));
        assert_eq!(OrderSignature::from(converted), sig);
    }

    #[test]
    fn test_view_remaining_keeps_price() {
        let market = crate::types::Market::native(crate::types::Token::new(
            Address::repeat_byte(1),
            "TKN",
            18,
        ));
        // Sell 10 TKN for 0.01 ETH, 0.004 ETH already filled
        let order = Order::new(
            Address::ZERO,
            Address::ZERO,
            U256::from(10_000_000_000_000_000u64),
            Address::repeat_byte(1),
            U256::from(10_000_000_000_000_000_000u128),
            100,
            U256::from(1),
            Address::repeat_byte(2),
        );
        let full = order.view(&market).unwrap();
        let rem = order
            .view_remaining(&market, U256::from(4_000_000_000_000_000u64))
            .unwrap();
        assert_eq!(rem.side, Side::Sell);
        assert_eq!(rem.price, full.price);
        assert_eq!(rem.quote_amount, U256::from(6_000_000_000_000_000u64));
        assert_eq!(rem.base_amount, U256::from(6_000_000_000_000_000_000u128));
        assert!(
            order
                .view_remaining(&market, U256::from(10_000_000_000_000_000u64))
                .is_none()
        );
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let order = Order::new(
            address!("0x8d12A197cB00D4747a1fe03395095ce2A5CC6819"),
            Address::ZERO,
            U256::from(1),
            Address::ZERO,
            U256::from(1),
            100,
            U256::from(1),
            Address::ZERO,
        );
        assert!(!order.is_expired(99));
        assert!(order.is_expired(100));
        assert!(order.is_expired(101));
    }
}
