//! Error types for barcode decoding

pub use uic_core::error::{UicError, UicResult};
