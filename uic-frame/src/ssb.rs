//! SSB frame header
//!
//! # Frame Layout
//!
//! ```text
//! bits      field
//! 0..4      version (1..=3)
//! 4..18     issuer company code
//! 18..22    ticket type id
//! 22..26    key id
//! 26..464   ticket data, kept opaque
//! bytes
//! 58..114   raw DSA signature r‖s, 28 + 28 bytes
//! ```
//!
//! Bytes 0..58 are the signed data.

use crate::error::{UicError, UicResult};
use uic_core::BitBuffer;
use uic_security::signature::{der_to_raw, raw_to_der, split_raw};
use uic_security::{PrivateKey, SigningAlgorithm};

/// Fixed size of an SSB frame
pub const SSB_FRAME_LEN: usize = 114;

/// Bytes covered by the signature
pub const SSB_SIGNED_LEN: usize = 58;

/// Width of each raw signature component
const SIGNATURE_COMPONENT_LEN: usize = 28;

const TICKET_START_BIT: usize = 26;
const TICKET_END_BIT: usize = SSB_SIGNED_LEN * 8;

/// Bytes holding the opaque ticket bits, left-aligned
pub const SSB_TICKET_DATA_LEN: usize = (TICKET_END_BIT - TICKET_START_BIT).div_ceil(8);

/// Valid SSB version numbers
pub const SSB_VERSIONS: std::ops::RangeInclusive<u8> = 1..=3;

/// An SSB frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsbFrame {
    pub version: u8,
    /// Issuer company code (14 bits)
    pub issuer: u16,
    /// Ticket type id (4 bits)
    pub ticket_type: u8,
    /// Signature key id (4 bits)
    pub key_id: u8,
    /// Ticket bits 26..464, re-aligned to bit 0
    pub ticket_data: Vec<u8>,
    /// DER signature, empty when unsigned
    pub signature: Vec<u8>,
}

impl SsbFrame {
    /// Check the frame size and the version nibble
    pub fn looks_like_ssb(data: &[u8]) -> bool {
        data.len() == SSB_FRAME_LEN && SSB_VERSIONS.contains(&(data[0] >> 4))
    }

    /// Decode an SSB frame
    ///
    /// # Error Handling
    /// - `FrameSizeMismatch` unless `data` is exactly 114 bytes
    /// - `UnsupportedVersion` for a version nibble outside 1..=3
    pub fn decode(data: &[u8]) -> UicResult<Self> {
        if data.len() != SSB_FRAME_LEN {
            return Err(UicError::FrameSizeMismatch {
                expected: SSB_FRAME_LEN,
                actual: data.len(),
            });
        }
        let buffer = BitBuffer::from_bytes(data);
        let version = buffer.get_integer_at(0, 4)? as u8;
        if !SSB_VERSIONS.contains(&version) {
            return Err(UicError::UnsupportedVersion(format!("SSB version {}", version)));
        }

        let raw_signature = &data[SSB_SIGNED_LEN..];
        let signature = if raw_signature.iter().all(|&b| b == 0) {
            Vec::new()
        } else {
            let (r, s) = split_raw(raw_signature)?;
            raw_to_der(r, s)?
        };

        Ok(Self {
            version,
            issuer: buffer.get_integer_at(4, 14)? as u16,
            ticket_type: buffer.get_integer_at(18, 4)? as u8,
            key_id: buffer.get_integer_at(22, 4)? as u8,
            ticket_data: buffer.copy_bits(TICKET_START_BIT, TICKET_END_BIT)?,
            signature,
        })
    }

    /// The 58 bytes covered by the signature
    pub fn signed_data(&self) -> UicResult<Vec<u8>> {
        if self.ticket_data.len() > SSB_TICKET_DATA_LEN {
            return Err(UicError::InvalidData(format!(
                "SSB ticket data of {} bytes exceeds {}",
                self.ticket_data.len(),
                SSB_TICKET_DATA_LEN
            )));
        }
        let mut buffer = BitBuffer::with_capacity_bytes(SSB_SIGNED_LEN);
        buffer.put_integer_at(0, 4, u64::from(self.version))?;
        buffer.put_integer_at(4, 14, u64::from(self.issuer))?;
        buffer.put_integer_at(18, 4, u64::from(self.ticket_type))?;
        buffer.put_integer_at(22, 4, u64::from(self.key_id))?;

        let ticket = BitBuffer::from_bytes(&self.ticket_data);
        let ticket_bits = (TICKET_END_BIT - TICKET_START_BIT).min(ticket.limit());
        for i in 0..ticket_bits {
            buffer.put_bit_at(TICKET_START_BIT + i, ticket.get_bit_at(i)?);
        }

        let mut bytes = buffer.into_bytes();
        bytes.resize(SSB_SIGNED_LEN, 0);
        Ok(bytes)
    }

    /// Encode the frame to its 114 bytes
    pub fn encode(&self) -> UicResult<Vec<u8>> {
        let mut out = self.signed_data()?;
        if self.signature.is_empty() {
            out.resize(SSB_FRAME_LEN, 0);
        } else {
            out.extend(der_to_raw(&self.signature, SIGNATURE_COMPONENT_LEN)?);
        }
        Ok(out)
    }

    /// Sign the first 58 bytes and store the DER signature
    pub fn sign(&mut self, private_key: &PrivateKey, algorithm: SigningAlgorithm) -> UicResult<()> {
        let signed = self.signed_data()?;
        self.signature = uic_security::sign(&signed, private_key, algorithm)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SsbFrame {
        let mut ticket_data = vec![0u8; SSB_TICKET_DATA_LEN];
        ticket_data[0] = 0xA5;
        ticket_data[54] = 0xC0;
        SsbFrame {
            version: 3,
            issuer: 1080,
            ticket_type: 2,
            key_id: 7,
            ticket_data,
            signature: Vec::new(),
        }
    }

    #[test]
    fn test_header_bits() {
        let bytes = sample().encode().unwrap();
        assert_eq!(bytes.len(), SSB_FRAME_LEN);
        // 0011 | 00010000111000 | 0010 | 0111 | 10...
        assert_eq!(bytes[0], 0x31);
        assert_eq!(bytes[1], 0x0E);
        assert_eq!(bytes[2], 0x09);
        assert_eq!(bytes[3] >> 6, 0b11);
        assert!(SsbFrame::looks_like_ssb(&bytes));
    }

    #[test]
    fn test_roundtrip_with_signature() {
        let mut frame = sample();
        frame.signature = raw_to_der(&[0x9A; 28], &[0x01; 28]).unwrap();
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[58..86], &[0x9A; 28]);

        let decoded = SsbFrame::decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.signed_data().unwrap(), &bytes[..58]);
    }

    #[test]
    fn test_rejects_bad_frames() {
        assert!(matches!(
            SsbFrame::decode(&[0x10; 113]),
            Err(UicError::FrameSizeMismatch { expected: 114, actual: 113 })
        ));
        let mut bytes = sample().encode().unwrap();
        bytes[0] = 0x51;
        assert!(matches!(SsbFrame::decode(&bytes), Err(UicError::UnsupportedVersion(_))));
        assert!(!SsbFrame::looks_like_ssb(&bytes));
    }

    #[test]
    fn test_field_overflow() {
        let mut frame = sample();
        frame.ticket_type = 16;
        assert!(matches!(frame.encode(), Err(UicError::ConstraintViolation { .. })));
    }
}
