//! Error types for the frame codecs

pub use uic_core::error::{UicError, UicResult};
