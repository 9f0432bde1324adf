//! Payload compression
//!
//! Static Frame payloads are zlib-wrapped DEFLATE. Some producers write bare
//! DEFLATE, so decompression accepts both: a leading 2-byte zlib header (its
//! big-endian value a multiple of 31) is stripped and the remainder inflated
//! as raw DEFLATE, the trailing Adler-32 being ignored.

use crate::error::{UicError, UicResult};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Default upper bound for decompressed payloads (1 MiB)
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 1024 * 1024;

/// Compress `data` as zlib-wrapped DEFLATE
pub fn compress(data: &[u8]) -> UicResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| UicError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| UicError::Compression(e.to_string()))
}

/// Decompress zlib-wrapped or raw DEFLATE data
///
/// # Error Handling
/// Returns `Decompression` if the stream is corrupt or inflates to more
/// than `max_size` bytes.
pub fn decompress(data: &[u8], max_size: usize) -> UicResult<Vec<u8>> {
    if has_zlib_header(data) {
        match inflate(&data[2..], max_size) {
            Ok(output) => return Ok(output),
            Err(Inflate::Corrupt(message)) => {
                log::debug!("zlib-wrapped inflate failed ({}), retrying as raw DEFLATE", message);
            }
            Err(e) => return Err(e.into()),
        }
    }
    inflate(data, max_size).map_err(UicError::from)
}

enum Inflate {
    Corrupt(String),
    TooLarge(usize),
}

impl From<Inflate> for UicError {
    fn from(e: Inflate) -> Self {
        match e {
            Inflate::Corrupt(message) => UicError::Decompression(message),
            Inflate::TooLarge(max_size) => UicError::Decompression(format!(
                "Decompressed size exceeds limit of {} bytes",
                max_size
            )),
        }
    }
}

fn has_zlib_header(data: &[u8]) -> bool {
    data.len() >= 2 && u16::from_be_bytes([data[0], data[1]]) % 31 == 0
}

fn inflate(data: &[u8], max_size: usize) -> Result<Vec<u8>, Inflate> {
    let limit = u64::try_from(max_size).unwrap_or(u64::MAX).saturating_add(1);
    let mut decoder = DeflateDecoder::new(data).take(limit);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| Inflate::Corrupt(e.to_string()))?;
    if output.len() > max_size {
        return Err(Inflate::TooLarge(max_size));
    }
    Ok(output)
}
