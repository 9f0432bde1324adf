//! ASN.1 processing for UIC barcodes
//!
//! This crate provides the two encodings the barcode formats rely on:
//!
//! - **UPER** (Unaligned Packed Encoding Rules): the bit-packed encoding of the
//!   Dynamic Frame and of the FCB ticket payload. Only the subset the fixed
//!   schemas need is implemented: SEQUENCE with optional fields and extension
//!   markers, constrained and unconstrained INTEGER, ENUMERATED, IA5String,
//!   OCTET STRING, SEQUENCE OF and OBJECT IDENTIFIER.
//! - **DER** (Distinguished Encoding Rules): used for signatures
//!   (`SEQUENCE { INTEGER r, INTEGER s }`), public keys and certificates.

pub mod der;
pub mod error;
pub mod oid;
pub mod uper;

pub use der::{DerDecoder, DerEncoder, DerLength, DerTag, DerTagClass};
pub use error::{UicError, UicResult};
pub use oid::ObjectIdentifier;
pub use uper::{UperDecode, UperDecoder, UperEncode, UperEncoder};
