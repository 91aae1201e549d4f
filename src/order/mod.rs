//! Order hashing, signing and local validation.
//!
//! Every order that leaves the client goes through [`sign`], which checks
//! that the signature recovers to the order's maker. Orders received from
//! the shared store go through [`verify`] before they are traded against.

mod error;
pub mod hash;
mod sign;
mod validate;

pub use error::OrderError;
pub use hash::order_hash;
pub use sign::{recover_signer, sign, verify, verify_signature};
pub use validate::{validate, validate_amounts};
