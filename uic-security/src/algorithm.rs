//! Signing algorithm table
//!
//! Barcodes name their algorithms by OBJECT IDENTIFIER, either in the frame
//! itself (Dynamic Frame level-1/level-2 fields) or through the key that
//! verifies them. The set is closed: anything outside this table is reported
//! as an unknown algorithm, never as a failed verification.

use crate::error::{UicError, UicResult};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;

/// EC public key
///
/// OID: 1.2.840.10045.2.1
pub const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";

/// Named curve P-256 (secp256r1)
pub const OID_CURVE_P256: &str = "1.2.840.10045.3.1.7";

/// Named curve P-384 (secp384r1)
pub const OID_CURVE_P384: &str = "1.3.132.0.34";

/// Named curve P-521 (secp521r1)
pub const OID_CURVE_P521: &str = "1.3.132.0.35";

/// ECDSA with SHA-256
pub const OID_ECDSA_SHA256: &str = "1.2.840.10045.4.3.2";

/// ECDSA with SHA-384
pub const OID_ECDSA_SHA384: &str = "1.2.840.10045.4.3.3";

/// ECDSA with SHA-512
pub const OID_ECDSA_SHA512: &str = "1.2.840.10045.4.3.4";

/// DSA public key
///
/// OID: 1.2.840.10040.4.1
pub const OID_DSA_PUBLIC_KEY: &str = "1.2.840.10040.4.1";

/// DSA with SHA-1
pub const OID_DSA_SHA1: &str = "1.2.840.10040.4.3";

/// DSA with SHA-224
pub const OID_DSA_SHA224: &str = "2.16.840.1.101.3.4.3.1";

/// DSA with SHA-256
pub const OID_DSA_SHA256: &str = "2.16.840.1.101.3.4.3.2";

/// Largest DER DSA signature still produced with SHA-1 (2 x 20-byte components)
pub const DSA_SHA1_MAX_SIGNATURE_LEN: usize = 48;

/// Largest DER DSA signature still produced with SHA-224 (2 x 28-byte components)
pub const DSA_SHA224_MAX_SIGNATURE_LEN: usize = 64;

/// Message digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Hash `data`
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Digest size in bytes
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Pick the DSA hash from the DER length of a signature
    ///
    /// DSA keys do not name their hash, but the hash output size bounds the
    /// subgroup order and thereby the signature size.
    pub fn for_dsa_signature_len(len: usize) -> Self {
        if len <= DSA_SHA1_MAX_SIGNATURE_LEN {
            HashAlgorithm::Sha1
        } else if len <= DSA_SHA224_MAX_SIGNATURE_LEN {
            HashAlgorithm::Sha224
        } else {
            HashAlgorithm::Sha256
        }
    }
}

/// NIST prime curves supported for ECDSA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    /// Named curve OID
    pub fn oid(&self) -> &'static str {
        match self {
            EcCurve::P256 => OID_CURVE_P256,
            EcCurve::P384 => OID_CURVE_P384,
            EcCurve::P521 => OID_CURVE_P521,
        }
    }

    /// Get curve from its named curve OID
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            OID_CURVE_P256 => Some(EcCurve::P256),
            OID_CURVE_P384 => Some(EcCurve::P384),
            OID_CURVE_P521 => Some(EcCurve::P521),
            _ => None,
        }
    }

    /// Field element size in bytes (width of each raw signature component)
    pub fn field_len(&self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }

    /// Infer the curve from an uncompressed SEC1 point length
    pub fn from_point_len(len: usize) -> Option<Self> {
        match len {
            65 => Some(EcCurve::P256),
            97 => Some(EcCurve::P384),
            133 => Some(EcCurve::P521),
            _ => None,
        }
    }
}

/// Public key algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Ec,
    Dsa,
}

impl KeyAlgorithm {
    /// Key algorithm OID
    pub fn oid(&self) -> &'static str {
        match self {
            KeyAlgorithm::Ec => OID_EC_PUBLIC_KEY,
            KeyAlgorithm::Dsa => OID_DSA_PUBLIC_KEY,
        }
    }

    /// Get key algorithm from its OID
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            OID_EC_PUBLIC_KEY => Some(KeyAlgorithm::Ec),
            OID_DSA_PUBLIC_KEY => Some(KeyAlgorithm::Dsa),
            _ => None,
        }
    }

    /// Default signing algorithm for this key type
    ///
    /// # Arguments
    /// * `signature_len` - DER length of the signature being verified, used
    ///   to pick the DSA hash
    pub fn default_signing_algorithm(&self, signature_len: usize) -> SigningAlgorithm {
        match self {
            KeyAlgorithm::Ec => SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256),
            KeyAlgorithm::Dsa => {
                SigningAlgorithm::Dsa(HashAlgorithm::for_dsa_signature_len(signature_len))
            }
        }
    }
}

/// Signing algorithm (signature scheme plus digest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    Ecdsa(HashAlgorithm),
    Dsa(HashAlgorithm),
}

impl SigningAlgorithm {
    /// Get signing algorithm from its OID
    ///
    /// Returns `None` for OIDs outside the supported table.
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid.trim() {
            OID_ECDSA_SHA256 => Some(SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256)),
            OID_ECDSA_SHA384 => Some(SigningAlgorithm::Ecdsa(HashAlgorithm::Sha384)),
            OID_ECDSA_SHA512 => Some(SigningAlgorithm::Ecdsa(HashAlgorithm::Sha512)),
            OID_DSA_SHA1 => Some(SigningAlgorithm::Dsa(HashAlgorithm::Sha1)),
            OID_DSA_SHA224 => Some(SigningAlgorithm::Dsa(HashAlgorithm::Sha224)),
            OID_DSA_SHA256 => Some(SigningAlgorithm::Dsa(HashAlgorithm::Sha256)),
            _ => None,
        }
    }

    /// Get signing algorithm from its OID, failing on unknown OIDs
    pub fn parse_oid(oid: &str) -> UicResult<Self> {
        Self::from_oid(oid).ok_or_else(|| {
            UicError::UnsupportedAlgorithm(format!("Unknown signing algorithm OID: {}", oid))
        })
    }

    /// Signing algorithm OID
    ///
    /// # Error Handling
    /// Returns `UnsupportedAlgorithm` for combinations without an OID
    /// (e.g. DSA with SHA-384).
    pub fn oid(&self) -> UicResult<&'static str> {
        match self {
            SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256) => Ok(OID_ECDSA_SHA256),
            SigningAlgorithm::Ecdsa(HashAlgorithm::Sha384) => Ok(OID_ECDSA_SHA384),
            SigningAlgorithm::Ecdsa(HashAlgorithm::Sha512) => Ok(OID_ECDSA_SHA512),
            SigningAlgorithm::Dsa(HashAlgorithm::Sha1) => Ok(OID_DSA_SHA1),
            SigningAlgorithm::Dsa(HashAlgorithm::Sha224) => Ok(OID_DSA_SHA224),
            SigningAlgorithm::Dsa(HashAlgorithm::Sha256) => Ok(OID_DSA_SHA256),
            other => Err(UicError::UnsupportedAlgorithm(format!(
                "No OID for {}",
                other
            ))),
        }
    }

    /// Digest used by this algorithm
    pub fn hash(&self) -> HashAlgorithm {
        match self {
            SigningAlgorithm::Ecdsa(hash) | SigningAlgorithm::Dsa(hash) => *hash,
        }
    }

    /// Key algorithm this signing algorithm needs
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            SigningAlgorithm::Ecdsa(_) => KeyAlgorithm::Ec,
            SigningAlgorithm::Dsa(_) => KeyAlgorithm::Dsa,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningAlgorithm::Ecdsa(hash) => write!(f, "ECDSA-{:?}", hash),
            SigningAlgorithm::Dsa(hash) => write!(f, "DSA-{:?}", hash),
        }
    }
}
