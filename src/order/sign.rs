use alloy::{primitives::Address, signers::Signer};

use super::OrderError;
use crate::types::Order;

/// Signs the order hash with the personal-message scheme and attaches the
/// signature.
///
/// The signer must be the order's maker. The signature is recovered back
/// before returning, so a returned order is always self-consistent.
pub async fn sign<S>(order: Order, signer: &S) -> Result<Order, OrderError>
where
    S: Signer + Send + Sync,
{
    if signer.address() != order.user() {
        return Err(OrderError::SignerMismatch {
            expected: order.user(),
            recovered: signer.address(),
        });
    }
    let signature = signer
        .sign_message(order.hash().as_slice())
        .await
        .map_err(|e| OrderError::Signing(e.to_string()))?;
    let signed = order.with_signature(signature.into());
    verify_signature(&signed)?;
    Ok(signed)
}

/// Address recovered from the order's signature over its prefixed hash.
pub fn recover_signer(order: &Order) -> Result<Address, OrderError> {
    let signature = order.signature().ok_or(OrderError::Unsigned)?;
    signature
        .to_signature()
        .recover_address_from_msg(order.hash().as_slice())
        .map_err(|e| OrderError::InvalidSignature(e.to_string()))
}

/// Checks that the signature recovers to the order's maker.
pub fn verify_signature(order: &Order) -> Result<(), OrderError> {
    let recovered = recover_signer(order)?;
    if recovered != order.user() {
        return Err(OrderError::SignerMismatch {
            expected: order.user(),
            recovered,
        });
    }
    Ok(())
}

/// Full check of an order received from elsewhere: the stored hash must
/// match the parameters for `exchange` and the signature must recover to
/// the maker.
pub fn verify(order: &Order, exchange: Address) -> Result<(), OrderError> {
    let expected = order.compute_hash(exchange);
    if expected != order.hash() {
        return Err(OrderError::HashMismatch {
            expected,
            actual: order.hash(),
        });
    }
    verify_signature(order)
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{U256, address},
        signers::local::PrivateKeySigner,
    };

    use super::*;
    use crate::types::OrderSignature;

    const EXCHANGE: Address = address!("0x8d12A197cB00D4747a1fe03395095ce2A5CC6819");

    fn order_of(user: Address) -> Order {
        Order::new(
            EXCHANGE,
            Address::ZERO,
            U256::from(1_000_000_000_000_000u64),
            address!("0x1111111111111111111111111111111111111111"),
            U256::from(1_000_000_000_000_000_000u64),
            1_000,
            U256::from(42),
            user,
        )
    }

    #[tokio::test]
    async fn test_sign_recovers_to_maker() {
        let signer = PrivateKeySigner::random();
        let order = sign(order_of(signer.address()), &signer).await.unwrap();

        let signature = order.signature().unwrap();
        assert!(signature.v() == 27 || signature.v() == 28);
        assert_eq!(recover_signer(&order).unwrap(), signer.address());
        assert!(verify(&order, EXCHANGE).is_ok());
    }

    #[tokio::test]
    async fn test_sign_rejects_foreign_order() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let err = sign(order_of(other.address()), &signer).await.unwrap_err();
        assert!(matches!(err, OrderError::SignerMismatch { .. }));
    }

    #[tokio::test]
    async fn test_verify_detects_signature_of_another_key() {
        let maker = PrivateKeySigner::random();
        let forger = PrivateKeySigner::random();
        let forged = sign(order_of(forger.address()), &forger).await.unwrap();
        let tampered = order_of(maker.address()).with_signature(*forged.signature().unwrap());

        let err = verify_signature(&tampered).unwrap_err();
        assert_eq!(
            err,
            OrderError::SignerMismatch {
                expected: maker.address(),
                recovered: forger.address(),
            }
        );
    }

    #[tokio::test]
    async fn test_verify_detects_other_exchange() {
        let signer = PrivateKeySigner::random();
        let order = sign(order_of(signer.address()), &signer).await.unwrap();
        let err = verify(&order, Address::ZERO).unwrap_err();
        assert!(matches!(err, OrderError::HashMismatch { .. }));
    }

    #[test]
    fn test_recover_unsigned_order() {
        assert_eq!(
            recover_signer(&order_of(Address::ZERO)).unwrap_err(),
            OrderError::Unsigned
        );
        let garbage = order_of(Address::ZERO).with_signature(OrderSignature::new(
            27,
            Default::default(),
            Default::default(),
        ));
        assert!(recover_signer(&garbage).is_err());
    }
}
