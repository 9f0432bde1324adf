//! Error types re-exported from `uic-core`

pub use uic_core::error::{UicError, UicResult};
