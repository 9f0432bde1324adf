//! DER decoder
//!
//! A forward-only TLV reader over a byte slice. Constructed values are
//! returned as their content slice; wrap that slice in a fresh `DerDecoder`
//! to walk the nested elements.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use uic_asn1::der::DerDecoder;
//! # fn main() -> uic_asn1::UicResult<()> {
//! # let signature: Vec<u8> = Vec::new();
//!
//! let mut outer = DerDecoder::new(&signature);
//! let mut pair = DerDecoder::new(outer.decode_sequence()?);
//! let r = pair.decode_integer_bytes()?;
//! let s = pair.decode_integer_bytes()?;
//! # Ok(())
//! # }
//! ```

use crate::der::types::{DerLength, DerTag, DerTagClass, universal};
use crate::error::{UicError, UicResult};
use crate::oid::ObjectIdentifier;

/// DER decoder over a byte slice
pub struct DerDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> DerDecoder<'a> {
    /// Create a new DER decoder
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get current position in buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there is more data to decode
    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Peek at the next tag without consuming it
    pub fn peek_tag(&self) -> UicResult<DerTag> {
        DerTag::decode(&self.buffer[self.position..]).map(|(tag, _)| tag)
    }

    fn read_bytes(&mut self, count: usize) -> UicResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(UicError::InvalidDer(format!(
                "Buffer exhausted: need {} bytes, have {}",
                count,
                self.remaining()
            )));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..start + count])
    }

    /// Decode a TLV (Tag-Length-Value) triplet
    ///
    /// # Returns
    /// Returns `Ok((tag, value_bytes, total_bytes_consumed))` if successful.
    pub fn decode_tlv(&mut self) -> UicResult<(DerTag, &'a [u8], usize)> {
        let start_pos = self.position;

        let (tag, tag_bytes) = DerTag::decode(&self.buffer[self.position..])?;
        self.position += tag_bytes;

        let (length, length_bytes) = match DerLength::decode(&self.buffer[self.position..]) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.position = start_pos;
                return Err(e);
            }
        };
        self.position += length_bytes;

        let value = match self.read_bytes(length.value()) {
            Ok(value) => value,
            Err(e) => {
                self.position = start_pos;
                return Err(e);
            }
        };

        Ok((tag, value, self.position - start_pos))
    }

    fn decode_universal(&mut self, constructed: bool, number: u32, name: &str) -> UicResult<&'a [u8]> {
        let (tag, value, _) = self.decode_tlv()?;
        if !tag.is_universal(constructed, number) {
            return Err(UicError::InvalidDer(format!(
                "Expected {} tag, got {:?}",
                name, tag
            )));
        }
        Ok(value)
    }

    /// Decode an INTEGER, returning its raw two's complement content octets
    ///
    /// Signature components and key parameters exceed any machine integer,
    /// so callers get the bytes and interpret the magnitude themselves.
    pub fn decode_integer_bytes(&mut self) -> UicResult<&'a [u8]> {
        let value = self.decode_universal(false, universal::INTEGER, "INTEGER")?;
        if value.is_empty() {
            return Err(UicError::InvalidDer("Empty integer encoding".to_string()));
        }
        Ok(value)
    }

    /// Decode a small INTEGER into an `i64`
    pub fn decode_integer(&mut self) -> UicResult<i64> {
        let bytes = self.decode_integer_bytes()?;
        if bytes.len() > 8 {
            return Err(UicError::InvalidDer(format!(
                "Integer too large: {} bytes (max 8)",
                bytes.len()
            )));
        }
        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes {
            value = (value << 8) | i64::from(byte);
        }
        Ok(value)
    }

    /// Decode an OCTET STRING
    pub fn decode_octet_string(&mut self) -> UicResult<&'a [u8]> {
        self.decode_universal(false, universal::OCTET_STRING, "OCTET STRING")
    }

    /// Decode a BIT STRING
    ///
    /// # Returns
    /// Returns `(unused_bits, bytes)`.
    pub fn decode_bit_string(&mut self) -> UicResult<(u8, &'a [u8])> {
        let value = self.decode_universal(false, universal::BIT_STRING, "BIT STRING")?;
        let Some((&unused_bits, bytes)) = value.split_first() else {
            return Err(UicError::InvalidDer("Empty bit string encoding".to_string()));
        };
        if unused_bits > 7 {
            return Err(UicError::InvalidDer(format!(
                "Invalid unused bits: {} (must be 0-7)",
                unused_bits
            )));
        }
        Ok((unused_bits, bytes))
    }

    /// Decode an OBJECT IDENTIFIER
    pub fn decode_object_identifier(&mut self) -> UicResult<ObjectIdentifier> {
        let value = self.decode_universal(false, universal::OBJECT_IDENTIFIER, "OBJECT IDENTIFIER")?;
        ObjectIdentifier::from_ber_content(value)
    }

    /// Decode a SEQUENCE, returning its content
    pub fn decode_sequence(&mut self) -> UicResult<&'a [u8]> {
        self.decode_universal(true, universal::SEQUENCE, "SEQUENCE")
    }

    /// Decode a context-specific tag
    pub fn decode_context_specific(&mut self, expected_tag_number: u32, constructed: bool) -> UicResult<&'a [u8]> {
        let (tag, value, _) = self.decode_tlv()?;
        if tag.class() != DerTagClass::ContextSpecific
            || tag.is_constructed() != constructed
            || tag.number() != expected_tag_number
        {
            return Err(UicError::InvalidDer(format!(
                "Expected context-specific tag {}, got {:?}",
                expected_tag_number, tag
            )));
        }
        Ok(value)
    }

    /// Skip a TLV (useful for skipping optional fields)
    ///
    /// # Returns
    /// Returns the number of bytes skipped.
    pub fn skip_tlv(&mut self) -> UicResult<usize> {
        let (_, _, bytes_consumed) = self.decode_tlv()?;
        Ok(bytes_consumed)
    }
}
