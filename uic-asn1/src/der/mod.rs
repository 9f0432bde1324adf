//! DER (Distinguished Encoding Rules) subset
//!
//! Only the pieces barcode signatures need: the `SEQUENCE { r INTEGER,
//! s INTEGER }` signature value, SubjectPublicKeyInfo, X.509 certificates
//! (walked far enough to reach the key) and PKCS#8 private keys.
//!
//! Each value is a TLV triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! Lengths use the short form below 128 and the minimal long form above;
//! indefinite lengths are rejected.

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::DerDecoder;
pub use encoder::DerEncoder;
pub use types::{DerLength, DerTag, DerTagClass, universal};
