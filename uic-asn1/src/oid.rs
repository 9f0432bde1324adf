//! OBJECT IDENTIFIER values
//!
//! The content octets use the BER/DER form in both encodings: the first two
//! arcs are combined as `40 * arc0 + arc1`, every component is written
//! base-128 with the continuation bit (bit 7) set on all but the last byte.
//! UPER reuses these content octets verbatim behind a length determinant.

use crate::error::{UicError, UicResult};
use std::fmt;
use std::str::FromStr;

/// An ASN.1 OBJECT IDENTIFIER
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentifier {
    arcs: Vec<u64>,
}

impl ObjectIdentifier {
    /// Create an OID from its arcs
    ///
    /// # Error Handling
    /// Returns error if there are fewer than two arcs, the first arc is not
    /// 0, 1 or 2, or the second arc is out of range (below 40 under arcs 0
    /// and 1, small enough for `80 + arc1` to fit a `u64` under arc 2).
    pub fn new(arcs: Vec<u64>) -> UicResult<Self> {
        if arcs.len() < 2 {
            return Err(UicError::InvalidData(format!(
                "OID needs at least two arcs, got {}",
                arcs.len()
            )));
        }
        if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) || arcs[1].checked_add(arcs[0] * 40).is_none() {
            return Err(UicError::InvalidData(format!(
                "Invalid leading OID arcs {}.{}",
                arcs[0], arcs[1]
            )));
        }
        Ok(Self { arcs })
    }

    /// OID arcs
    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    /// Encode to BER/DER content octets (without tag and length)
    pub fn to_ber_content(&self) -> Vec<u8> {
        let mut result = Vec::new();
        push_base128(&mut result, self.arcs[0] * 40 + self.arcs[1]);
        for &arc in &self.arcs[2..] {
            push_base128(&mut result, arc);
        }
        result
    }

    /// Decode from BER/DER content octets
    pub fn from_ber_content(content: &[u8]) -> UicResult<Self> {
        if content.is_empty() {
            return Err(UicError::Asn1Decoding("Empty object identifier encoding".to_string()));
        }

        let mut components = Vec::new();
        let mut value = 0u64;
        let mut pending = false;
        for &byte in content {
            if value > (u64::MAX >> 7) {
                return Err(UicError::Asn1Decoding("OID component overflow".to_string()));
            }
            value = (value << 7) | u64::from(byte & 0x7F);
            pending = byte & 0x80 != 0;
            if !pending {
                components.push(value);
                value = 0;
            }
        }
        if pending {
            return Err(UicError::Asn1Decoding(
                "Truncated object identifier component".to_string(),
            ));
        }

        let first = components[0];
        let (arc0, arc1) = match first {
            0..=39 => (0, first),
            40..=79 => (1, first - 40),
            _ => (2, first - 80),
        };
        let mut arcs = Vec::with_capacity(components.len() + 1);
        arcs.push(arc0);
        arcs.push(arc1);
        arcs.extend_from_slice(&components[1..]);
        Ok(Self { arcs })
    }
}

fn push_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        groups.push(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    groups.reverse();
    out.extend_from_slice(&groups);
}

impl FromStr for ObjectIdentifier {
    type Err = UicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .trim()
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| UicError::InvalidData(format!("Invalid OID string: {}", s)))
            })
            .collect::<UicResult<Vec<_>>>()?;
        Self::new(arcs)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}
