//! UPER (Unaligned Packed Encoding Rules) encoder and decoder
//!
//! UPER packs every value into the minimum number of bits its constraints
//! allow, without byte alignment. The conventions shared by every SEQUENCE
//! in the barcode schemas:
//!
//! ```text
//! [extension bit]   only if the type has an extension marker (`...`)
//! [presence bitmap] one bit per OPTIONAL/DEFAULT field, declaration order
//! [root fields]     in declaration order
//! [extensions]      only if the extension bit was set; skipped on decode
//! ```
//!
//! Whether a type has an extension marker is a property of its schema, so
//! each type's `UperDecode`/`UperEncode` implementation decides whether to
//! read or write the bit.

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::UperDecoder;
pub use encoder::UperEncoder;
pub use types::{UperDecode, UperEncode, constrained_bit_width};

use crate::error::UicResult;

/// Decode a complete value from UPER bytes
pub fn from_uper_bytes<T: UperDecode>(data: &[u8]) -> UicResult<T> {
    let mut decoder = UperDecoder::new(data);
    T::decode_uper(&mut decoder)
}

/// Encode a complete value to UPER bytes, zero-padded to a whole byte
pub fn to_uper_bytes<T: UperEncode>(value: &T) -> UicResult<Vec<u8>> {
    let mut encoder = UperEncoder::new();
    value.encode_uper(&mut encoder)?;
    Ok(encoder.into_bytes())
}
