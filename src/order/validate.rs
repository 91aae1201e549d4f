use alloy::primitives::U256;

use super::OrderError;
use crate::types::Order;

/// Rejects orders with a zero amount on either side.
pub fn validate_amounts(amount_get: U256, amount_give: U256) -> Result<(), OrderError> {
    if amount_get.is_zero() || amount_give.is_zero() {
        return Err(OrderError::ZeroAmount);
    }
    Ok(())
}

/// Local checks of an order about to be executed: non-zero amounts,
/// signature present, and not expired at `block_number` when it is known.
pub fn validate(order: &Order, block_number: Option<u64>) -> Result<(), OrderError> {
    validate_amounts(order.amount_get(), order.amount_give())?;
    if !order.is_signed() {
        return Err(OrderError::Unsigned);
    }
    if let Some(block) = block_number.filter(|b| order.is_expired(*b)) {
        return Err(OrderError::Expired {
            expires: order.expires(),
            block,
        });
    }
    Ok(())
}
