//! UPER encoder
//!
//! The structural mirror of [`UperDecoder`](crate::uper::UperDecoder): every
//! `encode_*` method writes exactly the bits the matching `decode_*` reads.

use crate::error::{UicError, UicResult};
use crate::oid::ObjectIdentifier;
use crate::uper::types::{
    MAX_UNFRAGMENTED_LENGTH, NORMALLY_SMALL_BITS, SHORT_LENGTH_LIMIT, UperEncode,
    constrained_bit_width,
};
use uic_core::BitBuffer;

/// UPER encoder accumulating into a growable bit buffer
pub struct UperEncoder {
    buffer: BitBuffer,
}

impl UperEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {
            buffer: BitBuffer::new(),
        }
    }

    /// Get current position in bits
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    /// Bits `start..end` of what has been written, re-aligned to bit 0
    pub fn copy_bits(&self, start: usize, end: usize) -> UicResult<Vec<u8>> {
        self.buffer.copy_bits(start, end)
    }

    /// Get encoded bytes, zero-padded to a whole byte
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }

    /// Encode a BOOLEAN
    pub fn encode_bool(&mut self, value: bool) {
        self.buffer.put_bit(value);
    }

    /// Encode the extension bit
    pub fn encode_extension_marker(&mut self, extended: bool) {
        self.buffer.put_bit(extended);
    }

    /// Encode a presence bitmap
    pub fn encode_presence_bitmap(&mut self, bitmap: &[bool]) {
        for &present in bitmap {
            self.buffer.put_bit(present);
        }
    }

    /// Encode a constrained whole number `min..=max`
    ///
    /// # Error Handling
    /// Returns `ConstraintViolation` if `value` is outside the range; an
    /// out-of-range value is a caller contract violation, never truncated.
    pub fn encode_constrained_integer(&mut self, value: i64, min: i64, max: i64) -> UicResult<()> {
        if value < min || value > max {
            return Err(UicError::ConstraintViolation { value, min, max });
        }
        let bits = constrained_bit_width(min, max);
        self.buffer.put_bits(value.wrapping_sub(min) as u64, bits)
    }

    /// Encode an unconstrained INTEGER in minimal two's complement octets
    pub fn encode_unconstrained_integer(&mut self, value: i64) -> UicResult<()> {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        // Drop redundant sign octets
        while start < 7 {
            let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
                || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        self.encode_length_determinant(8 - start)?;
        self.buffer.put_bytes(&bytes[start..]);
        Ok(())
    }

    /// Encode an ENUMERATED index without extension marker
    pub fn encode_enumerated(&mut self, index: usize, count: usize) -> UicResult<()> {
        if count == 0 {
            return Err(UicError::Asn1Encoding("Empty enumeration".to_string()));
        }
        self.encode_constrained_integer(index as i64, 0, count as i64 - 1)
    }

    /// Encode a length determinant
    ///
    /// # Error Handling
    /// Lengths above 16383 would need fragmentation, which the barcode
    /// schemas never use; they are rejected.
    pub fn encode_length_determinant(&mut self, length: usize) -> UicResult<()> {
        if length < SHORT_LENGTH_LIMIT {
            self.buffer.put_bits(length as u64, 8)
        } else if length <= MAX_UNFRAGMENTED_LENGTH {
            self.buffer.put_bits(0x8000 | length as u64, 16)
        } else {
            Err(UicError::Asn1Encoding(format!(
                "Length {} requires fragmentation",
                length
            )))
        }
    }

    /// Encode a normally small length (count of extension additions)
    pub fn encode_normally_small_length(&mut self, length: usize) -> UicResult<()> {
        if (1..=64).contains(&length) {
            self.buffer.put_bit(false);
            self.buffer.put_bits((length - 1) as u64, NORMALLY_SMALL_BITS)
        } else {
            self.buffer.put_bit(true);
            self.encode_length_determinant(length)
        }
    }

    /// Encode an unconstrained IA5String
    pub fn encode_ia5_string(&mut self, value: &str) -> UicResult<()> {
        self.encode_length_determinant(value.len())?;
        self.encode_ia5_string_sized(value, value.len())
    }

    /// Encode an IA5String of fixed size (no length determinant)
    pub fn encode_ia5_string_sized(&mut self, value: &str, length: usize) -> UicResult<()> {
        if value.len() != length {
            return Err(UicError::Asn1Encoding(format!(
                "IA5String '{}' must be exactly {} characters",
                value, length
            )));
        }
        for byte in value.bytes() {
            if !byte.is_ascii() {
                return Err(UicError::Asn1Encoding(format!(
                    "Non IA5 character in '{}'",
                    value
                )));
            }
            self.buffer.put_bits(u64::from(byte), 7)?;
        }
        Ok(())
    }

    /// Encode an unconstrained OCTET STRING
    pub fn encode_octet_string(&mut self, value: &[u8]) -> UicResult<()> {
        self.encode_length_determinant(value.len())?;
        self.buffer.put_bytes(value);
        Ok(())
    }

    /// Encode an OBJECT IDENTIFIER (length + BER content octets)
    pub fn encode_object_identifier(&mut self, value: &ObjectIdentifier) -> UicResult<()> {
        self.encode_octet_string(&value.to_ber_content())
    }

    /// Encode a SEQUENCE OF `T`
    pub fn encode_sequence_of<T: UperEncode>(&mut self, items: &[T]) -> UicResult<()> {
        self.encode_length_determinant(items.len())?;
        for item in items {
            item.encode_uper(self)?;
        }
        Ok(())
    }
}

impl Default for UperEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uper::{UperDecoder, constrained_bit_width};
    use proptest::prelude::*;

    #[test]
    fn test_encode_out_of_range_rejected() {
        let mut encoder = UperEncoder::new();
        assert_eq!(
            encoder.encode_constrained_integer(0, 1, 366),
            Err(UicError::ConstraintViolation {
                value: 0,
                min: 1,
                max: 366
            })
        );
        assert!(encoder.encode_constrained_integer(367, 1, 366).is_err());
        assert_eq!(encoder.position(), 0);
    }

    #[test]
    fn test_encode_length_determinant() {
        let mut encoder = UperEncoder::new();
        encoder.encode_length_determinant(300).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x81, 0x2C]);

        let mut encoder = UperEncoder::new();
        assert!(encoder.encode_length_determinant(16384).is_err());
    }

    #[test]
    fn test_encode_object_identifier() {
        let oid = "1.2.840.10040.4.3".parse().unwrap();
        let mut encoder = UperEncoder::new();
        encoder.encode_object_identifier(&oid).unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(bytes, vec![0x07, 0x2A, 0x86, 0x48, 0xCE, 0x38, 0x04, 0x03]);

        let mut decoder = UperDecoder::new(&bytes);
        assert_eq!(decoder.decode_object_identifier().unwrap(), oid);
    }

    #[test]
    fn test_encode_non_ascii_rejected() {
        let mut encoder = UperEncoder::new();
        assert!(encoder.encode_ia5_string("Zürich").is_err());
        assert!(encoder.encode_ia5_string_sized("EU", 3).is_err());
    }

    proptest! {
        #[test]
        fn prop_constrained_integer_law(min in -100_000i64..100_000, span in 0i64..200_000, pick in 0.0f64..=1.0) {
            let max = min + span;
            let value = min + ((span as f64) * pick) as i64;
            let mut encoder = UperEncoder::new();
            encoder.encode_constrained_integer(value, min, max).unwrap();
            prop_assert_eq!(encoder.position(), constrained_bit_width(min, max));
            let bytes = encoder.into_bytes();
            let mut decoder = UperDecoder::new(&bytes);
            prop_assert_eq!(decoder.decode_constrained_integer(min, max).unwrap(), value);
        }
    }
}
