use alloy::primitives::U256;
use fastnum::{
    UD128, UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Raw token amount to decimal converter, scaled by token decimals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals as u8
    }

    /// Decimal of width `N`, or `None` when `value` does not fit into it.
    pub fn try_from_unsigned<const N: usize>(&self, value: U256) -> Option<UnsignedDecimal<N>> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())?;
        Some(UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        ))
    }

    /// Full width decimal, any `U256` fits.
    pub fn from_unsigned(&self, value: U256) -> UD256 {
        self.try_from_unsigned(value).unwrap_or(UD256::MAX)
    }

    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }
}

/// Price of `base` expressed in `quote`, both given as raw token amounts.
///
/// Returns `None` when the base amount is zero or either amount exceeds
/// the range of [`UD128`].
pub fn price(
    base: U256,
    base_converter: Converter,
    quote: U256,
    quote_converter: Converter,
) -> Option<UD128> {
    if base.is_zero() {
        return None;
    }
    let base: UD128 = base_converter.try_from_unsigned(base)?;
    let quote: UD128 = quote_converter.try_from_unsigned(quote)?;
    Some(quote / base)
}

/// `value * numerator / denominator` over raw amounts, rounded down.
///
/// Zero denominator yields zero.
pub fn mul_div(value: U256, numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    value.saturating_mul(numerator) / denominator
}
