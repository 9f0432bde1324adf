//! Signature value codec
//!
//! Barcodes carry DSA/ECDSA signatures in two shapes: DER
//! `SEQUENCE { r INTEGER, s INTEGER }` and fixed-width raw `r‖s`. Producers
//! do not always agree on which shape goes where, so every frame normalizes
//! to DER in memory and converts back on encode.

use crate::error::{UicError, UicResult};
use uic_asn1::der::{DerDecoder, DerEncoder};

/// Parse a DER signature into its `(r, s)` magnitudes
///
/// Leading zero octets (DER sign padding) are stripped from both values.
pub fn parse_der_components(signature: &[u8]) -> UicResult<(Vec<u8>, Vec<u8>)> {
    let mut outer = DerDecoder::new(signature);
    let content = outer.decode_sequence()?;
    let mut pair = DerDecoder::new(content);
    let r = strip_leading_zeros(pair.decode_integer_bytes()?);
    let s = strip_leading_zeros(pair.decode_integer_bytes()?);
    if pair.has_remaining() {
        return Err(UicError::InvalidDer(
            "Trailing data inside signature sequence".to_string(),
        ));
    }
    Ok((r.to_vec(), s.to_vec()))
}

/// Convert a DER signature to raw `r‖s`, each component `width` bytes
///
/// # Error Handling
/// Returns `InvalidDer` if the structure is malformed or a component does
/// not fit in `width` bytes.
pub fn der_to_raw(signature: &[u8], width: usize) -> UicResult<Vec<u8>> {
    let (r, s) = parse_der_components(signature)?;
    let mut raw = Vec::with_capacity(width * 2);
    raw.extend_from_slice(&left_pad(&r, width)?);
    raw.extend_from_slice(&left_pad(&s, width)?);
    Ok(raw)
}

/// Encode big-endian magnitudes `r` and `s` as a canonical DER signature
pub fn raw_to_der(r: &[u8], s: &[u8]) -> UicResult<Vec<u8>> {
    let mut pair = DerEncoder::with_capacity(r.len() + s.len() + 6);
    pair.encode_unsigned_integer_bytes(r)?;
    pair.encode_unsigned_integer_bytes(s)?;
    let mut outer = DerEncoder::new();
    outer.encode_sequence(&pair.into_bytes())?;
    Ok(outer.into_bytes())
}

/// Split a raw `r‖s` block into its two halves
pub fn split_raw(raw: &[u8]) -> UicResult<(&[u8], &[u8])> {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return Err(UicError::Signature(format!(
            "Raw signature length {} is not two equal components",
            raw.len()
        )));
    }
    Ok(raw.split_at(raw.len() / 2))
}

/// Re-emit a DER signature in canonical form
pub fn normalize_der(signature: &[u8]) -> UicResult<Vec<u8>> {
    let (r, s) = parse_der_components(signature)?;
    raw_to_der(&r, &s)
}

/// Check whether `bytes` open with a DER `(r, s)` pair
///
/// Bytes after the sequence are ignored, so a zero-padded signature slot
/// qualifies.
pub fn looks_like_der(bytes: &[u8]) -> bool {
    parse_der_components(bytes).is_ok()
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn left_pad(value: &[u8], width: usize) -> UicResult<Vec<u8>> {
    if value.len() > width {
        return Err(UicError::InvalidDer(format!(
            "Signature component of {} bytes exceeds width {}",
            value.len(),
            width
        )));
    }
    let mut padded = vec![0u8; width - value.len()];
    padded.extend_from_slice(value);
    Ok(padded)
}
