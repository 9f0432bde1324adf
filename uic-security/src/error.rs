//! Error types for the security layer

pub use uic_core::error::{UicError, UicResult};
