use thiserror::Error;

/// Main error type for UIC barcode operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UicError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("Unsupported barcode format: {0}")]
    UnsupportedFormat(String),

    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("Buffer underflow: need {needed} bits, {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    #[error("Buffer overflow: requested {requested} bits, at most {max} allowed")]
    BufferOverflow { requested: usize, max: usize },

    #[error("Invalid bit position {position} (limit {limit})")]
    InvalidBitPosition { position: usize, limit: usize },

    #[error("ASN.1 decoding error: {0}")]
    Asn1Decoding(String),

    #[error("ASN.1 encoding error: {0}")]
    Asn1Encoding(String),

    #[error("Constraint violation: {value} not in {min}..={max}")]
    ConstraintViolation { value: i64, min: i64, max: i64 },

    #[error("Unsupported extension: {0}")]
    UnsupportedExtension(String),

    #[error("Invalid DER: {0}")]
    InvalidDer(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Compression failed: {0}")]
    Compression(String),

    #[error("Decompression failed: {0}")]
    Decompression(String),
}

/// Result type alias for UIC barcode operations
pub type UicResult<T> = Result<T, UicError>;
