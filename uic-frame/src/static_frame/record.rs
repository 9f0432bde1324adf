//! Static Frame payload records
//!
//! # Record Layout
//!
//! ```text
//! tag(6 ASCII) | version(2 ASCII) | length(4 ASCII decimal) | content
//! ```
//!
//! `length` counts the whole record including the 12 header bytes.

use crate::error::{UicError, UicResult};
use serde::{Deserialize, Serialize};

/// Size of the tag, version and length fields
pub const RECORD_HEADER_LEN: usize = 12;

/// Largest record the 4-digit length field can describe
pub const MAX_RECORD_LEN: usize = 9999;

/// Main ticket header record
pub const TAG_HEAD: &str = "U_HEAD";

/// Ticket layout (text fields) record
pub const TAG_LAYOUT: &str = "U_TLAY";

/// FCB ticket record
pub const TAG_FLEX: &str = "U_FLEX";

/// A payload record kept as tag, version and raw content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    pub tag: String,
    pub version: String,
    pub content: Vec<u8>,
}

impl DataRecord {
    /// Create a new record
    pub fn new(tag: impl Into<String>, version: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            tag: tag.into(),
            version: version.into(),
            content,
        }
    }

    /// Encode the record with its 12-byte header
    pub fn encode(&self) -> UicResult<Vec<u8>> {
        let total = RECORD_HEADER_LEN + self.content.len();
        if total > MAX_RECORD_LEN {
            return Err(UicError::InvalidData(format!(
                "Record {} too long: {} bytes (max {})",
                self.tag, total, MAX_RECORD_LEN
            )));
        }
        let mut out = Vec::with_capacity(total);
        push_fixed(&mut out, &self.tag, 6, "record tag")?;
        push_fixed(&mut out, &self.version, 2, "record version")?;
        push_decimal(&mut out, total, 4, "record length")?;
        out.extend_from_slice(&self.content);
        Ok(out)
    }
}

/// Split a decompressed payload into records
///
/// Records are read back to back until fewer than 13 bytes remain.
pub fn split_records(payload: &[u8]) -> UicResult<Vec<DataRecord>> {
    let mut records = Vec::new();
    let mut offset = 0;
    while payload.len() - offset > RECORD_HEADER_LEN {
        let rest = &payload[offset..];
        let tag = ascii_field(rest, 0, 6, "record tag")?;
        let version = ascii_field(rest, 6, 2, "record version")?;
        let length = decimal_field(rest, 8, 4, "record length")?;
        if length < RECORD_HEADER_LEN || length > rest.len() {
            return Err(UicError::InvalidData(format!(
                "Record {} declares length {} with {} bytes left",
                tag,
                length,
                rest.len()
            )));
        }
        records.push(DataRecord {
            tag,
            version,
            content: rest[RECORD_HEADER_LEN..length].to_vec(),
        });
        offset += length;
    }
    if offset < payload.len() {
        log::trace!("Ignoring {} trailing payload bytes", payload.len() - offset);
    }
    Ok(records)
}

/// Read a fixed-width text field, trimming padding
pub(crate) fn ascii_field(bytes: &[u8], start: usize, len: usize, name: &str) -> UicResult<String> {
    let raw = bytes.get(start..start + len).ok_or_else(|| {
        UicError::InvalidData(format!(
            "{} at {}..{} beyond {} bytes",
            name,
            start,
            start + len,
            bytes.len()
        ))
    })?;
    let text = std::str::from_utf8(raw)
        .map_err(|_| UicError::InvalidData(format!("{} is not valid text", name)))?;
    Ok(text.trim_matches(|c: char| c == ' ' || c == '\0').to_string())
}

/// Read a fixed-width ASCII decimal field
pub(crate) fn decimal_field(bytes: &[u8], start: usize, len: usize, name: &str) -> UicResult<usize> {
    let text = ascii_field(bytes, start, len, name)?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UicError::InvalidData(format!(
            "{} '{}' is not a decimal number",
            name, text
        )));
    }
    text.parse()
        .map_err(|_| UicError::InvalidData(format!("{} '{}' out of range", name, text)))
}

/// Append `text` right-padded with spaces to `len` bytes
pub(crate) fn push_fixed(out: &mut Vec<u8>, text: &str, len: usize, name: &str) -> UicResult<()> {
    if text.len() > len {
        return Err(UicError::InvalidData(format!(
            "{} '{}' longer than {} bytes",
            name, text, len
        )));
    }
    out.extend_from_slice(text.as_bytes());
    out.resize(out.len() + len - text.len(), b' ');
    Ok(())
}

/// Append `value` as a zero-padded decimal of exactly `len` digits
pub(crate) fn push_decimal(out: &mut Vec<u8>, value: usize, len: usize, name: &str) -> UicResult<()> {
    let text = format!("{:0width$}", value, width = len);
    if text.len() > len {
        return Err(UicError::InvalidData(format!(
            "{} {} does not fit in {} digits",
            name, value, len
        )));
    }
    out.extend_from_slice(text.as_bytes());
    Ok(())
}
