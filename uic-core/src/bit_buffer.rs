//! Bit-addressable buffer
//!
//! `BitBuffer` is the storage primitive every codec in this workspace is built
//! on. It owns a growable byte vector and a bit cursor. Bits are numbered
//! MSB-first: bit 0 is the most significant bit of byte 0.
//!
//! # Bounds
//!
//! Reads never go past `limit` and report a [`UicError::BufferUnderflow`]
//! instead. Writes past `limit` grow the storage (doubling, at least 256
//! bytes) so an encoder never has to pre-size its buffer.

use crate::error::{UicError, UicResult};
use std::fmt;

/// Minimum storage size after growth, in bytes
const MIN_GROWTH_BYTES: usize = 256;

/// Largest bit count accepted by `get_bits` / `put_bits`
pub const MAX_BITS_PER_ACCESS: usize = 64;

/// Growable bit buffer with a read/write cursor
#[derive(Clone, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    position: usize,
    limit: usize,
    /// Highest bit index (exclusive) ever written or loaded
    written: usize,
}

impl BitBuffer {
    /// Create an empty buffer for encoding
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            position: 0,
            limit: 0,
            written: 0,
        }
    }

    /// Create an empty buffer with `capacity` bytes of pre-allocated storage
    ///
    /// The pre-allocated bits are addressable (they read as zero) but do not
    /// count as written until something is stored there.
    pub fn with_capacity_bytes(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity],
            position: 0,
            limit: capacity * 8,
            written: 0,
        }
    }

    /// Create a buffer over existing data for decoding
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
            position: 0,
            limit: data.len() * 8,
            written: data.len() * 8,
        }
    }

    /// Current cursor position in bits
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total addressable bits
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bits between the cursor and the limit
    pub fn remaining_bits(&self) -> usize {
        self.limit.saturating_sub(self.position)
    }

    /// Whether the buffer holds no addressable bits
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    /// Bytes holding the written bits, last byte zero-padded
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.written.div_ceil(8)]
    }

    /// Consume the buffer, returning the written bytes
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.truncate(self.written.div_ceil(8));
        self.bytes
    }

    fn ensure_readable(&self, bits: usize) -> UicResult<()> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(UicError::BufferUnderflow {
                needed: bits,
                available,
            });
        }
        Ok(())
    }

    fn ensure_writable(&mut self, end_bit: usize) {
        if end_bit <= self.limit {
            return;
        }
        let mut new_len = self.bytes.len().max(MIN_GROWTH_BYTES / 2) * 2;
        while new_len * 8 < end_bit {
            new_len *= 2;
        }
        self.bytes.resize(new_len, 0);
        self.limit = new_len * 8;
    }

    fn read_raw(&self, index: usize) -> bool {
        (self.bytes[index / 8] >> (7 - (index % 8))) & 1 == 1
    }

    fn write_raw(&mut self, index: usize, value: bool) {
        let mask = 1u8 << (7 - (index % 8));
        if value {
            self.bytes[index / 8] |= mask;
        } else {
            self.bytes[index / 8] &= !mask;
        }
        if index + 1 > self.written {
            self.written = index + 1;
        }
    }

    /// Read one bit at the cursor and advance
    pub fn get_bit(&mut self) -> UicResult<bool> {
        self.ensure_readable(1)?;
        let bit = self.read_raw(self.position);
        self.position += 1;
        Ok(bit)
    }

    /// Write one bit at the cursor and advance
    pub fn put_bit(&mut self, value: bool) {
        self.ensure_writable(self.position + 1);
        self.write_raw(self.position, value);
        self.position += 1;
    }

    /// Read `count` bits MSB-first as an unsigned value
    ///
    /// # Error Handling
    /// - `BufferOverflow` if `count > 64`
    /// - `BufferUnderflow` if fewer than `count` bits remain
    pub fn get_bits(&mut self, count: usize) -> UicResult<u64> {
        if count > MAX_BITS_PER_ACCESS {
            return Err(UicError::BufferOverflow {
                requested: count,
                max: MAX_BITS_PER_ACCESS,
            });
        }
        self.ensure_readable(count)?;
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | u64::from(self.read_raw(self.position));
            self.position += 1;
        }
        Ok(value)
    }

    /// Read `count` bits as a two's complement signed value
    pub fn get_signed_bits(&mut self, count: usize) -> UicResult<i64> {
        let raw = self.get_bits(count)?;
        if count == 0 || count == 64 {
            return Ok(raw as i64);
        }
        if raw & (1u64 << (count - 1)) != 0 {
            Ok((raw | (u64::MAX << count)) as i64)
        } else {
            Ok(raw as i64)
        }
    }

    /// Write the low `count` bits of `value` MSB-first
    pub fn put_bits(&mut self, value: u64, count: usize) -> UicResult<()> {
        if count > MAX_BITS_PER_ACCESS {
            return Err(UicError::BufferOverflow {
                requested: count,
                max: MAX_BITS_PER_ACCESS,
            });
        }
        self.ensure_writable(self.position + count);
        for i in (0..count).rev() {
            self.write_raw(self.position, (value >> i) & 1 == 1);
            self.position += 1;
        }
        Ok(())
    }

    /// Read 8 bits
    pub fn get_byte(&mut self) -> UicResult<u8> {
        Ok(self.get_bits(8)? as u8)
    }

    /// Write 8 bits
    pub fn put_byte(&mut self, value: u8) {
        self.ensure_writable(self.position + 8);
        for i in (0..8).rev() {
            self.write_raw(self.position, (value >> i) & 1 == 1);
            self.position += 1;
        }
    }

    /// Read `count` bytes starting at the cursor (not necessarily aligned)
    pub fn get_bytes(&mut self, count: usize) -> UicResult<Vec<u8>> {
        self.ensure_readable(count.saturating_mul(8))?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.get_byte()?);
        }
        Ok(out)
    }

    /// Write all of `data` starting at the cursor
    pub fn put_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.put_byte(byte);
        }
    }

    /// Read the bit at `index` without moving the cursor
    pub fn get_bit_at(&self, index: usize) -> UicResult<bool> {
        if index >= self.limit {
            return Err(UicError::InvalidBitPosition {
                position: index,
                limit: self.limit,
            });
        }
        Ok(self.read_raw(index))
    }

    /// Write the bit at `index` without moving the cursor
    pub fn put_bit_at(&mut self, index: usize, value: bool) {
        self.ensure_writable(index + 1);
        self.write_raw(index, value);
    }

    /// Read an unsigned MSB-first integer of `length` bits at a fixed position
    ///
    /// Used by the fixed-layout frames; the cursor is not touched.
    pub fn get_integer_at(&self, index: usize, length: usize) -> UicResult<u64> {
        if length > MAX_BITS_PER_ACCESS {
            return Err(UicError::BufferOverflow {
                requested: length,
                max: MAX_BITS_PER_ACCESS,
            });
        }
        let end = index.checked_add(length).unwrap_or(usize::MAX);
        if end > self.limit {
            return Err(UicError::BufferUnderflow {
                needed: length,
                available: self.limit.saturating_sub(index),
            });
        }
        let mut value = 0u64;
        for i in index..end {
            value = (value << 1) | u64::from(self.read_raw(i));
        }
        Ok(value)
    }

    /// Write an unsigned MSB-first integer of `length` bits at a fixed position
    pub fn put_integer_at(&mut self, index: usize, length: usize, value: u64) -> UicResult<()> {
        if length > MAX_BITS_PER_ACCESS {
            return Err(UicError::BufferOverflow {
                requested: length,
                max: MAX_BITS_PER_ACCESS,
            });
        }
        if length < 64 && value >> length != 0 {
            return Err(UicError::ConstraintViolation {
                value: value as i64,
                min: 0,
                max: ((1u64 << length) - 1) as i64,
            });
        }
        self.ensure_writable(index + length);
        for i in 0..length {
            self.write_raw(index + i, (value >> (length - 1 - i)) & 1 == 1);
        }
        Ok(())
    }

    fn get_packed_string_at(
        &self,
        index: usize,
        chars: usize,
        width: usize,
        offset: u8,
    ) -> UicResult<String> {
        let mut text = String::with_capacity(chars);
        for i in 0..chars {
            let code = self.get_integer_at(index + i * width, width)? as u8;
            text.push(char::from(code + offset));
        }
        Ok(text.trim_end_matches(' ').to_string())
    }

    fn put_packed_string_at(
        &mut self,
        index: usize,
        chars: usize,
        width: usize,
        offset: u8,
        text: &str,
    ) -> UicResult<()> {
        let padded = text.chars().chain(std::iter::repeat(' ')).take(chars);
        for (i, c) in padded.enumerate() {
            let value = u32::from(c);
            if value < u32::from(offset) || value - u32::from(offset) >= (1 << width) {
                return Err(UicError::InvalidData(format!(
                    "Character '{}' not encodable in {} bits",
                    c, width
                )));
            }
            let code = u64::from(value - u32::from(offset));
            self.put_integer_at(index + i * width, width, code)?;
        }
        Ok(())
    }

    /// Decode `chars` 6-bit characters (codepoint + 32) at a fixed position,
    /// trimming trailing spaces
    pub fn get_char6_string_at(&self, index: usize, chars: usize) -> UicResult<String> {
        self.get_packed_string_at(index, chars, 6, 32)
    }

    /// Encode `text` as `chars` 6-bit characters, space padded
    pub fn put_char6_string_at(&mut self, index: usize, chars: usize, text: &str) -> UicResult<()> {
        self.put_packed_string_at(index, chars, 6, 32, text)
    }

    /// Decode `chars` 5-bit characters (codepoint + 42) at a fixed position,
    /// trimming trailing spaces
    pub fn get_char5_string_at(&self, index: usize, chars: usize) -> UicResult<String> {
        self.get_packed_string_at(index, chars, 5, 42)
    }

    /// Encode `text` as `chars` 5-bit characters (codepoint - 42)
    ///
    /// The 5-bit alphabet has no space, so `text` must fill the field.
    pub fn put_char5_string_at(&mut self, index: usize, chars: usize, text: &str) -> UicResult<()> {
        self.put_packed_string_at(index, chars, 5, 42, text)
    }

    /// Advance the cursor by `bits`
    pub fn skip(&mut self, bits: usize) -> UicResult<()> {
        self.ensure_readable(bits)?;
        self.position += bits;
        Ok(())
    }

    /// Move the cursor to an absolute bit position
    pub fn seek(&mut self, position: usize) -> UicResult<()> {
        if position > self.limit {
            return Err(UicError::InvalidBitPosition {
                position,
                limit: self.limit,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Move the cursor to the next byte boundary (no-op when aligned)
    pub fn align_to_byte(&mut self) {
        let aligned = self.position.div_ceil(8) * 8;
        if aligned > self.limit {
            self.ensure_writable(aligned);
        }
        self.position = aligned;
    }

    fn check_range(&self, start: usize, end: usize) -> UicResult<()> {
        if start > end {
            return Err(UicError::InvalidBitPosition {
                position: start,
                limit: end,
            });
        }
        if end > self.limit {
            return Err(UicError::InvalidBitPosition {
                position: end,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Underlying bytes covering the bit interval `start..end`
    ///
    /// Byte granularity: the first byte holds bit `start`, the last byte holds
    /// bit `end - 1`.
    pub fn extract_bytes(&self, start: usize, end: usize) -> UicResult<Vec<u8>> {
        self.check_range(start, end)?;
        Ok(self.bytes[start / 8..end.div_ceil(8)].to_vec())
    }

    /// Bits `start..end` shifted to start at bit 0, zero-padded to a byte
    ///
    /// This is what a standalone encoding of the same bits would look like,
    /// independent of where they sat inside the enclosing stream.
    pub fn copy_bits(&self, start: usize, end: usize) -> UicResult<Vec<u8>> {
        self.check_range(start, end)?;
        let len = end - start;
        let mut out = vec![0u8; len.div_ceil(8)];
        for i in 0..len {
            if self.read_raw(start + i) {
                out[i / 8] |= 1 << (7 - (i % 8));
            }
        }
        Ok(out)
    }
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for BitBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        let bits = bytes.len() * 8;
        Self {
            bytes,
            position: 0,
            limit: bits,
            written: bits,
        }
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitBuffer")
            .field("position", &self.position)
            .field("limit", &self.limit)
            .field("written", &self.written)
            .finish()
    }
}
