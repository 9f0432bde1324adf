//! UIC railway ticket barcodes
//!
//! Entry point of the workspace: detects the frame format of raw barcode
//! bytes, decodes it, and exposes a normalized view of the signature so
//! callers can validate it without caring which frame they got.
//!
//! # Architecture
//!
//! - `uic-core`: error taxonomy, bit buffer, frame classification
//! - `uic-asn1`: UPER and DER codecs
//! - `uic-security`: signature codec, keys, DSA/ECDSA dispatch
//! - `uic-frame`: Static, Dynamic and SSB frame codecs
//! - `uic-barcode`: detection, dispatch and validation (this crate)
//!
//! # Usage
//!
//! ```rust,no_run
//! use uic_barcode::{SignatureValidationResult, decode};
//! # fn main() -> uic_barcode::UicResult<()> {
//! # let (bytes, issuer_key): (Vec<u8>, Vec<u8>) = (Vec::new(), Vec::new());
//!
//! let barcode = decode(&bytes)?;
//! let result = barcode.validate_signature(Some(&issuer_key), None);
//! if result == SignatureValidationResult::Valid {
//!     println!("ticket from {}", barcode.security_provider()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod decoded;
pub mod detector;
pub mod error;
pub mod options;

pub use decoded::{DecodedBarcode, Frame, SignatureData};
pub use detector::{decode, decode_with, detect};
pub use error::{UicError, UicResult};
pub use options::{DecodeOptions, SharedTicketCodec};
pub use uic_core::FrameType;
pub use uic_frame::{DynamicFrame, FcbTicket, SsbFrame, StaticFrame, TicketCodec};
pub use uic_security::SignatureValidationResult;

use uic_frame::OpaqueTicketCodec;

/// Encode a frame to barcode bytes
///
/// FCB tickets in a Static Frame are written from their stored UPER bytes.
pub fn encode(frame: &Frame) -> UicResult<Vec<u8>> {
    frame.encode(&OpaqueTicketCodec)
}
