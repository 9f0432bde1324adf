//! UPER shared types and constants

use crate::error::UicResult;
use crate::uper::{UperDecoder, UperEncoder};

/// Largest length a single length determinant can carry (`10` + 14 bits)
pub const MAX_UNFRAGMENTED_LENGTH: usize = 16383;

/// Lengths below this use the one-byte form (`0` + 7 bits)
pub const SHORT_LENGTH_LIMIT: usize = 128;

/// Bits used to encode an ENUMERATED / small-number value 0..=63
pub const NORMALLY_SMALL_BITS: usize = 6;

/// Number of bits a constrained INTEGER `min..=max` occupies
///
/// `ceil(log2(max - min + 1))`; a single-value range takes no bits.
pub fn constrained_bit_width(min: i64, max: i64) -> usize {
    let range = max.wrapping_sub(min) as u64;
    if range == 0 {
        0
    } else {
        (64 - range.leading_zeros()) as usize
    }
}

/// A type with a fixed UPER decoding
pub trait UperDecode: Sized {
    /// Decode one value, consuming exactly the bits `encode_uper` produces
    fn decode_uper(decoder: &mut UperDecoder) -> UicResult<Self>;
}

/// A type with a fixed UPER encoding
pub trait UperEncode {
    /// Encode one value at the encoder's cursor
    fn encode_uper(&self, encoder: &mut UperEncoder) -> UicResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrained_bit_width() {
        assert_eq!(constrained_bit_width(1, 1), 0);
        assert_eq!(constrained_bit_width(0, 1), 1);
        assert_eq!(constrained_bit_width(1, 366), 9);
        assert_eq!(constrained_bit_width(0, 86399), 17);
        assert_eq!(constrained_bit_width(2016, 2269), 8);
        assert_eq!(constrained_bit_width(1, 32000), 15);
        assert_eq!(constrained_bit_width(0, 99999), 17);
    }
}
