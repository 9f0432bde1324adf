//! DER encoder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use uic_asn1::der::DerEncoder;
//! # fn main() -> uic_asn1::UicResult<()> {
//! # let (r, s): (Vec<u8>, Vec<u8>) = (Vec::new(), Vec::new());
//!
//! let mut pair = DerEncoder::new();
//! pair.encode_unsigned_integer_bytes(&r)?;
//! pair.encode_unsigned_integer_bytes(&s)?;
//! let mut outer = DerEncoder::new();
//! outer.encode_sequence(&pair.into_bytes())?;
//! # Ok(())
//! # }
//! ```

use crate::der::types::{DerLength, DerTag, universal};
use crate::error::{UicError, UicResult};
use crate::oid::ObjectIdentifier;

/// DER encoder
///
/// Each encoded value is appended as a TLV triplet. Lengths always take the
/// shortest form, so the output is canonical.
pub struct DerEncoder {
    buffer: Vec<u8>,
}

impl DerEncoder {
    /// Create a new DER encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new DER encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a TLV (Tag-Length-Value) triplet
    ///
    /// # Arguments
    /// * `tag` - DER tag
    /// * `value` - Value bytes (already encoded)
    pub fn encode_tlv(&mut self, tag: &DerTag, value: &[u8]) -> UicResult<()> {
        self.buffer.extend_from_slice(&tag.encode());
        self.buffer.extend_from_slice(&DerLength::new(value.len()).encode());
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    /// Encode a signed INTEGER in minimal two's complement form
    pub fn encode_integer(&mut self, value: i64) -> UicResult<()> {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        while start < 7 {
            let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
                || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        self.encode_tlv(&DerTag::universal(false, universal::INTEGER), &bytes[start..])
    }

    /// Encode a non-negative big-endian magnitude as an INTEGER
    ///
    /// Leading zero octets are stripped and a single `0x00` is prepended when
    /// the top bit would otherwise mark the value negative. An all-zero or
    /// empty magnitude encodes as zero.
    pub fn encode_unsigned_integer_bytes(&mut self, magnitude: &[u8]) -> UicResult<()> {
        let first_nonzero = magnitude.iter().position(|&b| b != 0);
        let trimmed = match first_nonzero {
            Some(index) => &magnitude[index..],
            None => &[][..],
        };
        let mut content = Vec::with_capacity(trimmed.len() + 1);
        if trimmed.first().is_none_or(|&b| b & 0x80 != 0) {
            content.push(0x00);
        }
        content.extend_from_slice(trimmed);
        self.encode_tlv(&DerTag::universal(false, universal::INTEGER), &content)
    }

    /// Encode an OCTET STRING
    pub fn encode_octet_string(&mut self, value: &[u8]) -> UicResult<()> {
        self.encode_tlv(&DerTag::universal(false, universal::OCTET_STRING), value)
    }

    /// Encode a BIT STRING
    ///
    /// # Arguments
    /// * `unused_bits` - Number of unused bits in the last byte (0-7)
    /// * `bytes` - Bit string content
    pub fn encode_bit_string(&mut self, unused_bits: u8, bytes: &[u8]) -> UicResult<()> {
        if unused_bits > 7 {
            return Err(UicError::InvalidDer(format!(
                "Invalid unused bits: {} (must be 0-7)",
                unused_bits
            )));
        }
        let mut content = Vec::with_capacity(bytes.len() + 1);
        content.push(unused_bits);
        content.extend_from_slice(bytes);
        self.encode_tlv(&DerTag::universal(false, universal::BIT_STRING), &content)
    }

    /// Encode an OBJECT IDENTIFIER
    pub fn encode_object_identifier(&mut self, oid: &ObjectIdentifier) -> UicResult<()> {
        self.encode_tlv(
            &DerTag::universal(false, universal::OBJECT_IDENTIFIER),
            &oid.to_ber_content(),
        )
    }

    /// Encode NULL
    pub fn encode_null(&mut self) -> UicResult<()> {
        self.encode_tlv(&DerTag::universal(false, universal::NULL), &[])
    }

    /// Wrap already encoded elements in a SEQUENCE
    pub fn encode_sequence(&mut self, content: &[u8]) -> UicResult<()> {
        self.encode_tlv(&DerTag::sequence(), content)
    }

    /// Wrap already encoded content in a context-specific tag
    pub fn encode_context_specific(&mut self, number: u32, constructed: bool, content: &[u8]) -> UicResult<()> {
        self.encode_tlv(&DerTag::context_specific(constructed, number), content)
    }

    /// Get encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for DerEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_unsigned_adds_sign_octet() {
        let mut encoder = DerEncoder::new();
        encoder.encode_unsigned_integer_bytes(&[0x00, 0x00, 0x80, 0x01]).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x02, 0x03, 0x00, 0x80, 0x01]);
    }

    #[test]
    fn test_encode_unsigned_zero() {
        let mut encoder = DerEncoder::new();
        encoder.encode_unsigned_integer_bytes(&[0x00, 0x00]).unwrap();
        assert_eq!(encoder.into_bytes(), vec![0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_integer_minimal() {
        let mut encoder = DerEncoder::new();
        encoder.encode_integer(127).unwrap();
        encoder.encode_integer(128).unwrap();
        encoder.encode_integer(-1).unwrap();
        assert_eq!(
            encoder.into_bytes(),
            vec![0x02, 0x01, 0x7F, 0x02, 0x02, 0x00, 0x80, 0x02, 0x01, 0xFF]
        );
    }

    #[test]
    fn test_encode_long_sequence_length() {
        let mut encoder = DerEncoder::new();
        encoder.encode_sequence(&[0u8; 136]).unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(&bytes[..3], &[0x30, 0x81, 136]);
        assert_eq!(bytes.len(), 139);
    }

    #[test]
    fn test_encode_bit_string_rejects_unused_bits() {
        let mut encoder = DerEncoder::new();
        assert!(encoder.encode_bit_string(8, &[0x00]).is_err());
    }
}
