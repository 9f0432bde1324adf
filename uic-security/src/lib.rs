//! Security layer for UIC barcodes
//!
//! This crate provides the signature codec (raw `r‖s` ↔ DER), the closed
//! table of signing algorithms, key parsing and DSA/ECDSA sign/verify
//! dispatch.

pub mod algorithm;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod signature;
pub mod validation;

pub use algorithm::{EcCurve, HashAlgorithm, KeyAlgorithm, SigningAlgorithm};
pub use crypto::{sign, verify};
pub use keys::{PrivateKey, PublicKey};
pub use signature::{der_to_raw, normalize_der, raw_to_der, split_raw};
pub use validation::{SignatureValidationResult, validate_signature};
