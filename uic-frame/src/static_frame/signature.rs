//! Static Frame signature slot
//!
//! - v1: 50-byte slot holding DER, zero-padded on the right
//! - v2: 64-byte slot holding raw `r‖s` (32 + 32 bytes); some encoders put
//!   DER there instead, which is accepted on decode
//!
//! In memory the signature is always DER. An all-zero slot means unsigned.

use crate::error::{UicError, UicResult};
use uic_security::signature::{der_to_raw, looks_like_der, normalize_der, raw_to_der, split_raw};

/// Signature slot size of a v1 frame
pub const V1_SIGNATURE_LEN: usize = 50;

/// Signature slot size of a v2 frame
pub const V2_SIGNATURE_LEN: usize = 64;

/// Width of each raw component in a v2 slot
const V2_COMPONENT_LEN: usize = 32;

/// Slot size for a frame version
pub fn slot_len(version: u8) -> UicResult<usize> {
    match version {
        1 => Ok(V1_SIGNATURE_LEN),
        2 => Ok(V2_SIGNATURE_LEN),
        other => Err(UicError::UnsupportedVersion(format!(
            "Static frame version {}",
            other
        ))),
    }
}

/// Normalize a signature slot to DER
pub fn decode_slot(version: u8, slot: &[u8]) -> UicResult<Vec<u8>> {
    if slot.iter().all(|&b| b == 0) {
        return Ok(Vec::new());
    }
    match version {
        1 => decode_v1(slot),
        2 => decode_v2(slot),
        other => Err(UicError::UnsupportedVersion(format!(
            "Static frame version {}",
            other
        ))),
    }
}

fn decode_v1(slot: &[u8]) -> UicResult<Vec<u8>> {
    let declared = usize::from(*slot.get(1).unwrap_or(&0));
    if slot[0] != 0x30 || declared == 0 || declared >= 0x80 || declared + 2 > slot.len() {
        return Err(UicError::InvalidDer(format!(
            "v1 signature slot does not start with a DER sequence (0x{:02X} 0x{:02X})",
            slot[0], declared
        )));
    }
    Ok(slot[..declared + 2].to_vec())
}

fn decode_v2(slot: &[u8]) -> UicResult<Vec<u8>> {
    if looks_like_der(slot) {
        log::debug!("v2 signature slot holds DER instead of raw r||s");
        return normalize_der(slot);
    }
    let (r, s) = split_raw(slot)?;
    raw_to_der(r, s)
}

/// Lay out a DER signature in the slot of the given frame version
pub fn encode_slot(version: u8, signature: &[u8]) -> UicResult<Vec<u8>> {
    let len = slot_len(version)?;
    if signature.is_empty() {
        return Ok(vec![0u8; len]);
    }
    let mut slot = if version == 1 {
        signature.to_vec()
    } else if signature[0] == 0x30 {
        match der_to_raw(signature, V2_COMPONENT_LEN) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("DER signature does not fit the v2 slot: {}", e);
                signature.to_vec()
            }
        }
    } else {
        signature.to_vec()
    };
    if slot.len() > len {
        log::warn!("Signature of {} bytes truncated to {}", slot.len(), len);
    }
    slot.resize(len, 0);
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_truncates_to_der_length() {
        let der = raw_to_der(&[0x12; 20], &[0x34; 20]).unwrap();
        let slot = encode_slot(1, &der).unwrap();
        assert_eq!(slot.len(), 50);
        assert_eq!(decode_slot(1, &slot).unwrap(), der);
    }

    #[test]
    fn test_v1_rejects_non_der() {
        let mut slot = vec![0u8; 50];
        slot[0] = 0x02;
        assert!(decode_slot(1, &slot).is_err());
        slot[0] = 0x30;
        slot[1] = 60;
        assert!(decode_slot(1, &slot).is_err());
    }

    #[test]
    fn test_v2_raw_with_high_bit() {
        let mut raw = vec![0u8; 64];
        raw[..32].copy_from_slice(&[0x81; 32]);
        raw[32..].copy_from_slice(&[0x01; 32]);
        let der = decode_slot(2, &raw).unwrap();
        // r gets a sign octet
        assert_eq!(&der[2..5], &[0x02, 0x21, 0x00]);
        assert_eq!(encode_slot(2, &der).unwrap(), raw);
    }

    #[test]
    fn test_v2_strips_leading_zeros() {
        let mut raw = vec![0u8; 64];
        raw[31] = 0x05;
        raw[63] = 0x06;
        let der = decode_slot(2, &raw).unwrap();
        assert_eq!(der, vec![0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x06]);
    }

    #[test]
    fn test_v2_der_in_raw_slot() {
        let der = raw_to_der(&[0x7F; 28], &[0x11; 28]).unwrap();
        assert_eq!(der.len(), 62);
        let mut slot = der.clone();
        slot.resize(V2_SIGNATURE_LEN, 0);

        let decoded = decode_slot(2, &slot).unwrap();
        assert_eq!(decoded, der);
        let raw = der_to_raw(&decoded, 28).unwrap();
        assert_eq!(&raw[..28], &[0x7F; 28]);
        assert_eq!(&raw[28..], &[0x11; 28]);
    }

    #[test]
    fn test_v2_raw_starting_with_sequence_tag() {
        // raw r beginning with 0x30 that does not parse as DER
        let mut raw = vec![0x30u8; 32];
        raw.extend_from_slice(&[0x44; 32]);
        let der = decode_slot(2, &raw).unwrap();
        assert_eq!(der_to_raw(&der, 32).unwrap(), raw);
    }

    #[test]
    fn test_unsigned_slot() {
        assert!(decode_slot(2, &[0u8; 64]).unwrap().is_empty());
        assert_eq!(encode_slot(1, &[]).unwrap(), vec![0u8; 50]);
    }
}
