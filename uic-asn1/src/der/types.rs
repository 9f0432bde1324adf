//! DER encoding types (Tag, Length)

use crate::error::{UicError, UicResult};

/// Universal tag numbers used by signatures, keys and certificates
pub mod universal {
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const SEQUENCE: u32 = 16;
}

/// DER Tag Class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl DerTagClass {
    /// Get tag class from bits 7-6 of the identifier octet
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => DerTagClass::Universal,
            1 => DerTagClass::Application,
            2 => DerTagClass::ContextSpecific,
            _ => DerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// DER Tag
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number > 30): first byte has all tag bits set, the
/// number follows base-128 with continuation bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerTag {
    class: DerTagClass,
    constructed: bool,
    number: u32,
}

impl DerTag {
    /// Create a new DER tag
    pub fn new(class: DerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(DerTagClass::Universal, constructed, number)
    }

    /// Create a Context-specific class tag
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(DerTagClass::ContextSpecific, constructed, number)
    }

    /// SEQUENCE tag (0x30)
    pub fn sequence() -> Self {
        Self::universal(true, universal::SEQUENCE)
    }

    /// Get tag class
    pub fn class(&self) -> DerTagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Check for a universal tag with the given number and form
    pub fn is_universal(&self, constructed: bool, number: u32) -> bool {
        self.class == DerTagClass::Universal
            && self.constructed == constructed
            && self.number == number
    }

    /// Encode tag to bytes
    pub fn encode(&self) -> Vec<u8> {
        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            return vec![class_bits | constructed_bit | (self.number as u8 & 0x1F)];
        }

        let mut result = vec![class_bits | constructed_bit | 0x1F];
        let mut remaining = self.number;
        let mut groups = Vec::new();
        while remaining > 0 {
            groups.push((remaining & 0x7F) as u8);
            remaining >>= 7;
        }
        for (i, &byte) in groups.iter().rev().enumerate() {
            if i < groups.len() - 1 {
                result.push(byte | 0x80);
            } else {
                result.push(byte);
            }
        }
        result
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// Returns `Ok((DerTag, bytes_consumed))` if successful
    pub fn decode(data: &[u8]) -> UicResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(UicError::InvalidDer("Empty buffer for tag decoding".to_string()));
        };

        let class = DerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, constructed, u32::from(tag_bits)), 1));
        }

        let mut tag_number = 0u32;
        let mut pos = 1;
        let mut has_more = true;
        while has_more && pos < data.len() {
            let byte = data[pos];
            has_more = (byte & 0x80) != 0;
            tag_number = (tag_number << 7) | u32::from(byte & 0x7F);
            pos += 1;
            if pos > 5 {
                return Err(UicError::InvalidDer(
                    "Tag number too large or invalid encoding".to_string(),
                ));
            }
        }
        if has_more {
            return Err(UicError::InvalidDer(
                "Incomplete extended tag encoding".to_string(),
            ));
        }
        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

/// DER Length encoding
///
/// - **Short form**: lengths 0-127, one byte
/// - **Long form**: `0x80 | n` followed by `n` big-endian length bytes
///
/// DER forbids the indefinite form; it is rejected on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127
    Long(usize),
}

impl DerLength {
    /// Create a length, choosing the short form when possible
    pub fn new(length: usize) -> Self {
        if length < 128 {
            DerLength::Short(length as u8)
        } else {
            DerLength::Long(length)
        }
    }

    /// Get the length value
    pub fn value(&self) -> usize {
        match self {
            DerLength::Short(l) => *l as usize,
            DerLength::Long(l) => *l,
        }
    }

    /// Encode length to bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            DerLength::Short(length) => vec![*length],
            DerLength::Long(length) => {
                let be = length.to_be_bytes();
                let skip = be.iter().take_while(|&&b| b == 0).count().min(be.len() - 1);
                let mut result = vec![0x80 | (be.len() - skip) as u8];
                result.extend_from_slice(&be[skip..]);
                result
            }
        }
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// Returns `Ok((DerLength, bytes_consumed))` if successful
    pub fn decode(data: &[u8]) -> UicResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(UicError::InvalidDer("Empty buffer for length decoding".to_string()));
        };

        if (first_byte & 0x80) == 0 {
            return Ok((DerLength::Short(first_byte), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Err(UicError::InvalidDer(
                "Indefinite length encoding not allowed".to_string(),
            ));
        }
        if num_bytes > 4 {
            return Err(UicError::InvalidDer(format!(
                "Length encoding too large: {} bytes (max 4)",
                num_bytes
            )));
        }
        if data.len() < 1 + num_bytes {
            return Err(UicError::InvalidDer(format!(
                "Buffer too short for long form length: need {} bytes, got {}",
                1 + num_bytes,
                data.len()
            )));
        }

        let mut length = 0usize;
        for &byte in &data[1..=num_bytes] {
            length = (length << 8) | byte as usize;
        }
        Ok((DerLength::Long(length), 1 + num_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_tag_sequence() {
        assert_eq!(DerTag::sequence().encode(), vec![0x30]);
        let (tag, consumed) = DerTag::decode(&[0x30, 0x00]).unwrap();
        assert_eq!(consumed, 1);
        assert!(tag.is_universal(true, universal::SEQUENCE));
    }

    #[test]
    fn test_der_tag_context_specific() {
        let tag = DerTag::context_specific(true, 0);
        assert_eq!(tag.encode(), vec![0xA0]);
        let (decoded, _) = DerTag::decode(&[0xA0]).unwrap();
        assert_eq!(decoded, tag);
    }

    #[test]
    fn test_der_tag_extended_roundtrip() {
        let tag = DerTag::context_specific(false, 200);
        let encoded = tag.encode();
        assert_eq!(encoded, vec![0x9F, 0x81, 0x48]);
        assert_eq!(DerTag::decode(&encoded).unwrap(), (tag, 3));
    }

    #[test]
    fn test_der_length_forms() {
        assert_eq!(DerLength::new(70).encode(), vec![70]);
        assert_eq!(DerLength::new(139).encode(), vec![0x81, 139]);
        assert_eq!(DerLength::new(300).encode(), vec![0x82, 0x01, 0x2C]);
        assert_eq!(DerLength::decode(&[0x82, 0x01, 0x2C]).unwrap(), (DerLength::Long(300), 3));
        assert!(DerLength::decode(&[0x80]).is_err());
        assert!(DerLength::decode(&[0x82, 0x01]).is_err());
    }
}
