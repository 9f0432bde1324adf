//! UPER decoder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use uic_asn1::uper::UperDecoder;
//! # fn main() -> uic_asn1::UicResult<()> {
//! # let data: Vec<u8> = Vec::new();
//!
//! let mut decoder = UperDecoder::new(&data);
//! let present = decoder.decode_presence_bitmap(2)?;
//! let day = decoder.decode_constrained_integer(1, 366)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{UicError, UicResult};
use crate::oid::ObjectIdentifier;
use crate::uper::types::{NORMALLY_SMALL_BITS, UperDecode, constrained_bit_width};
use uic_core::BitBuffer;

/// UPER decoder over a bit buffer
///
/// # Position Tracking
///
/// The decoder owns its buffer and cursor for the duration of one decode
/// pass. Callers that need the exact bits of a sub-structure (signed data)
/// record `position()` before and after decoding it and call `copy_bits`.
///
/// # Error Handling
///
/// Every read is bounds checked by the buffer; malformed length fields yield
/// `BufferUnderflow` rather than out-of-range access.
pub struct UperDecoder {
    buffer: BitBuffer,
}

impl UperDecoder {
    /// Create a new decoder over `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            buffer: BitBuffer::from_bytes(data),
        }
    }

    /// Create a decoder over an existing buffer
    pub fn from_buffer(buffer: BitBuffer) -> Self {
        Self { buffer }
    }

    /// Get current position in bits
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    /// Get remaining bits
    pub fn remaining_bits(&self) -> usize {
        self.buffer.remaining_bits()
    }

    /// Bits `start..end` re-aligned to bit 0
    pub fn copy_bits(&self, start: usize, end: usize) -> UicResult<Vec<u8>> {
        self.buffer.copy_bits(start, end)
    }

    /// Decode a BOOLEAN (one bit)
    pub fn decode_bool(&mut self) -> UicResult<bool> {
        self.buffer.get_bit()
    }

    /// Decode the extension bit of a type whose schema has an extension marker
    pub fn decode_extension_marker(&mut self) -> UicResult<bool> {
        self.buffer.get_bit()
    }

    /// Decode the presence bitmap for `count` OPTIONAL/DEFAULT fields
    pub fn decode_presence_bitmap(&mut self, count: usize) -> UicResult<Vec<bool>> {
        let mut bitmap = Vec::with_capacity(count);
        for _ in 0..count {
            bitmap.push(self.buffer.get_bit()?);
        }
        Ok(bitmap)
    }

    /// Decode a constrained whole number `min..=max`
    ///
    /// # Error Handling
    /// Returns `ConstraintViolation` if the offset read from the wire lands
    /// above `max` (possible when the range is not a power of two).
    pub fn decode_constrained_integer(&mut self, min: i64, max: i64) -> UicResult<i64> {
        let bits = constrained_bit_width(min, max);
        let offset = self.buffer.get_bits(bits)?;
        let value = min.wrapping_add(offset as i64);
        if value > max {
            return Err(UicError::ConstraintViolation { value, min, max });
        }
        Ok(value)
    }

    /// Decode an unconstrained INTEGER (length in octets + two's complement)
    pub fn decode_unconstrained_integer(&mut self) -> UicResult<i64> {
        let length = self.decode_length_determinant()?;
        if length == 0 || length > 8 {
            return Err(UicError::Asn1Decoding(format!(
                "Unsupported integer length: {} octets",
                length
            )));
        }
        self.buffer.get_signed_bits(length * 8)
    }

    /// Decode an ENUMERATED value without extension marker (`0..count`)
    pub fn decode_enumerated(&mut self, count: usize) -> UicResult<usize> {
        if count == 0 {
            return Err(UicError::Asn1Decoding("Empty enumeration".to_string()));
        }
        Ok(self.decode_constrained_integer(0, count as i64 - 1)? as usize)
    }

    /// Decode a length determinant
    ///
    /// # Decoding Format
    /// - `0` + 7 bits: length 0..=127
    /// - `10` + 14 bits: length 128..=16383
    /// - `11` + 6 bits: fragmented, not used by the barcode schemas
    pub fn decode_length_determinant(&mut self) -> UicResult<usize> {
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(7)? as usize);
        }
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(14)? as usize);
        }
        Err(UicError::UnsupportedExtension(
            "Fragmented length determinant".to_string(),
        ))
    }

    /// Decode a normally small length (count of extension additions)
    pub fn decode_normally_small_length(&mut self) -> UicResult<usize> {
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(NORMALLY_SMALL_BITS)? as usize + 1);
        }
        self.decode_length_determinant()
    }

    /// Decode an unconstrained IA5String
    pub fn decode_ia5_string(&mut self) -> UicResult<String> {
        let length = self.decode_length_determinant()?;
        self.decode_ia5_string_sized(length)
    }

    /// Decode an IA5String of fixed size (no length determinant)
    pub fn decode_ia5_string_sized(&mut self, length: usize) -> UicResult<String> {
        self.ensure_bits(length.saturating_mul(7))?;
        let mut text = String::with_capacity(length);
        for _ in 0..length {
            text.push(char::from(self.buffer.get_bits(7)? as u8));
        }
        Ok(text)
    }

    /// Decode an unconstrained OCTET STRING
    pub fn decode_octet_string(&mut self) -> UicResult<Vec<u8>> {
        let length = self.decode_length_determinant()?;
        self.buffer.get_bytes(length)
    }

    /// Decode an OBJECT IDENTIFIER (length + BER content octets)
    pub fn decode_object_identifier(&mut self) -> UicResult<ObjectIdentifier> {
        let content = self.decode_octet_string()?;
        ObjectIdentifier::from_ber_content(&content)
    }

    /// Decode a SEQUENCE OF `T`
    pub fn decode_sequence_of<T: UperDecode>(&mut self) -> UicResult<Vec<T>> {
        let count = self.decode_length_determinant()?;
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(T::decode_uper(self)?);
        }
        Ok(items)
    }

    /// Skip the extension additions that follow a set extension bit
    ///
    /// Reads the addition count and its presence bitmap, then skips each
    /// present addition's open-type content without interpreting it.
    pub fn skip_extensions(&mut self) -> UicResult<()> {
        let count = self.decode_normally_small_length()?;
        let present = self.decode_presence_bitmap(count)?;
        for (index, _) in present.iter().enumerate().filter(|(_, p)| **p) {
            let length = self.decode_length_determinant()?;
            log::debug!("Skipping extension addition {} ({} octets)", index, length);
            self.buffer.skip(length.saturating_mul(8))?;
        }
        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> UicResult<()> {
        let available = self.buffer.remaining_bits();
        if bits > available {
            return Err(UicError::BufferUnderflow {
                needed: bits,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uper::UperEncoder;

    #[test]
    fn test_decode_constrained_integer() {
        // 9 bits for 1..=366, value 100 => offset 99
        let mut encoder = UperEncoder::new();
        encoder.encode_constrained_integer(100, 1, 366).unwrap();
        assert_eq!(encoder.position(), 9);
        let bytes = encoder.into_bytes();

        let mut decoder = UperDecoder::new(&bytes);
        assert_eq!(decoder.decode_constrained_integer(1, 366).unwrap(), 100);
        assert_eq!(decoder.position(), 9);
    }

    #[test]
    fn test_decode_offset_above_max_rejected() {
        // 0..=2 uses 2 bits; offset 3 is out of range
        let mut decoder = UperDecoder::new(&[0b1100_0000]);
        assert!(matches!(
            decoder.decode_constrained_integer(0, 2),
            Err(UicError::ConstraintViolation { value: 3, .. })
        ));
    }

    #[test]
    fn test_decode_length_determinant_forms() {
        let mut decoder = UperDecoder::new(&[0x05]);
        assert_eq!(decoder.decode_length_determinant().unwrap(), 5);

        let mut decoder = UperDecoder::new(&[0x81, 0x00]);
        assert_eq!(decoder.decode_length_determinant().unwrap(), 256);

        let mut decoder = UperDecoder::new(&[0xC1]);
        assert!(matches!(
            decoder.decode_length_determinant(),
            Err(UicError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_decode_ia5_string() {
        // length 2, then 'U' (0x55) and '2' (0x32) in 7 bits each
        let mut encoder = UperEncoder::new();
        encoder.encode_ia5_string("U2").unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(bytes, vec![0x02, 0xAA, 0xC8]);

        let mut decoder = UperDecoder::new(&bytes);
        assert_eq!(decoder.decode_ia5_string().unwrap(), "U2");
    }

    #[test]
    fn test_octet_string_length_beyond_data() {
        let mut decoder = UperDecoder::new(&[0x7F, 0x01, 0x02]);
        assert!(matches!(
            decoder.decode_octet_string(),
            Err(UicError::BufferUnderflow { needed: 1016, .. })
        ));
    }

    #[test]
    fn test_decode_unconstrained_integer() {
        let mut encoder = UperEncoder::new();
        encoder.encode_unconstrained_integer(-129).unwrap();
        encoder.encode_unconstrained_integer(50_123_456).unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(&bytes[..3], &[0x02, 0xFF, 0x7F]);

        let mut decoder = UperDecoder::new(&bytes);
        assert_eq!(decoder.decode_unconstrained_integer().unwrap(), -129);
        assert_eq!(decoder.decode_unconstrained_integer().unwrap(), 50_123_456);
    }

    #[test]
    fn test_skip_extensions() {
        let mut encoder = UperEncoder::new();
        // two additions, only the second present, carrying 2 octets
        encoder.encode_normally_small_length(2).unwrap();
        encoder.encode_presence_bitmap(&[false, true]);
        encoder.encode_octet_string(&[0xDE, 0xAD]).unwrap();
        encoder.encode_constrained_integer(7, 0, 15).unwrap();
        let bytes = encoder.into_bytes();

        let mut decoder = UperDecoder::new(&bytes);
        decoder.skip_extensions().unwrap();
        assert_eq!(decoder.decode_constrained_integer(0, 15).unwrap(), 7);
    }
}
