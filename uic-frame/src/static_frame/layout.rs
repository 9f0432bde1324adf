//! `U_TLAY` ticket layout record
//!
//! # Content Layout
//!
//! ```text
//! standard(4) | field count(4) | field*
//! field: line(2) column(2) height(2) width(2) formatting(1) text length(4) text
//! ```
//!
//! The text length should count bytes, but some encoders write the number
//! of characters instead. Decoding tries byte lengths first and, if the
//! record does not parse that way, re-reads every text as a character count.
//! With byte lengths the fields must end the record; only zero padding may
//! follow them. Any other trailing byte means the lengths were character
//! counts.

use crate::error::{UicError, UicResult};
use crate::static_frame::record::{
    DataRecord, TAG_LAYOUT, ascii_field, decimal_field, push_decimal, push_fixed,
};
use serde::{Deserialize, Serialize};

const FIELD_HEADER_LEN: usize = 13;

/// One positioned text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutField {
    pub line: u8,
    pub column: u8,
    pub height: u8,
    pub width: u8,
    pub formatting: u8,
    pub text: String,
}

/// Ticket layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRecord {
    /// Layout standard, e.g. `RCT2`
    pub standard: String,
    pub fields: Vec<LayoutField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextLength {
    Bytes,
    Chars,
}

impl LayoutRecord {
    /// Record version written on encode
    pub const VERSION: &'static str = "01";

    /// Parse the content of a `U_TLAY` record
    pub fn decode(record: &DataRecord) -> UicResult<Self> {
        match Self::decode_with(&record.content, TextLength::Bytes) {
            Ok(layout) => Ok(layout),
            Err(byte_error) => {
                log::debug!(
                    "U_TLAY does not parse with byte lengths ({}), retrying with character counts",
                    byte_error
                );
                Self::decode_with(&record.content, TextLength::Chars)
            }
        }
    }

    fn decode_with(content: &[u8], mode: TextLength) -> UicResult<Self> {
        let standard = ascii_field(content, 0, 4, "layout standard")?;
        let count = decimal_field(content, 4, 4, "field count")?;

        let mut fields = Vec::with_capacity(count.min(64));
        let mut offset = 8;
        for _ in 0..count {
            let line = small_decimal(content, offset, 2, "line")?;
            let column = small_decimal(content, offset + 2, 2, "column")?;
            let height = small_decimal(content, offset + 4, 2, "height")?;
            let width = small_decimal(content, offset + 6, 2, "width")?;
            let formatting = small_decimal(content, offset + 8, 1, "formatting")?;
            let length = decimal_field(content, offset + 9, 4, "text length")?;
            offset += FIELD_HEADER_LEN;

            let (text, consumed) = match mode {
                TextLength::Bytes => {
                    let raw = content.get(offset..offset + length).ok_or_else(|| {
                        UicError::InvalidData(format!(
                            "Layout text of {} bytes at {} beyond {} bytes",
                            length,
                            offset,
                            content.len()
                        ))
                    })?;
                    let text = std::str::from_utf8(raw).map_err(|_| {
                        UicError::InvalidData(format!("Layout text at {} is not UTF-8", offset))
                    })?;
                    (text.to_string(), length)
                }
                TextLength::Chars => read_chars(&content[offset.min(content.len())..], length)?,
            };
            offset += consumed;

            fields.push(LayoutField {
                line,
                column,
                height,
                width,
                formatting,
                text,
            });
        }

        if mode == TextLength::Bytes && offset < content.len() {
            let trailing = &content[offset..];
            if trailing.iter().any(|&b| b != 0) {
                return Err(UicError::InvalidData(format!(
                    "{} bytes left after layout fields",
                    trailing.len()
                )));
            }
            log::trace!("Ignoring {} bytes of zero padding after layout fields", trailing.len());
        }
        Ok(Self { standard, fields })
    }

    /// Build the `U_TLAY` record (text lengths in bytes)
    pub fn to_record(&self) -> UicResult<DataRecord> {
        let mut content = Vec::new();
        push_fixed(&mut content, &self.standard, 4, "layout standard")?;
        push_decimal(&mut content, self.fields.len(), 4, "field count")?;
        for field in &self.fields {
            push_decimal(&mut content, usize::from(field.line), 2, "line")?;
            push_decimal(&mut content, usize::from(field.column), 2, "column")?;
            push_decimal(&mut content, usize::from(field.height), 2, "height")?;
            push_decimal(&mut content, usize::from(field.width), 2, "width")?;
            push_decimal(&mut content, usize::from(field.formatting), 1, "formatting")?;
            push_decimal(&mut content, field.text.len(), 4, "text length")?;
            content.extend_from_slice(field.text.as_bytes());
        }
        Ok(DataRecord::new(TAG_LAYOUT, Self::VERSION, content))
    }
}

fn small_decimal(content: &[u8], start: usize, len: usize, name: &str) -> UicResult<u8> {
    let value = decimal_field(content, start, len, name)?;
    u8::try_from(value).map_err(|_| UicError::InvalidData(format!("{} {} out of range", name, value)))
}

/// Read `chars` characters of UTF-8 from the front of `bytes`
///
/// Byte lengths from `chars` upward are tried until one decodes to exactly
/// `chars` characters. Without an exact match the longest valid decode with
/// fewer characters wins.
fn read_chars(bytes: &[u8], chars: usize) -> UicResult<(String, usize)> {
    let max_len = bytes.len().min(chars.saturating_mul(4));
    let mut longest = None;
    for len in chars.min(max_len)..=max_len {
        let Ok(text) = std::str::from_utf8(&bytes[..len]) else {
            continue;
        };
        let count = text.chars().count();
        if count == chars {
            return Ok((text.to_string(), len));
        }
        if count > chars {
            break;
        }
        longest = Some((text.to_string(), len));
    }
    longest.ok_or_else(|| {
        UicError::InvalidData(format!("No valid UTF-8 text of {} characters", chars))
    })
}
