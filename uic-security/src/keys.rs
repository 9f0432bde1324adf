//! Public and private key parsing
//!
//! Verification keys reach the codec as SubjectPublicKeyInfo DER, as a whole
//! X.509 certificate, or as a bare uncompressed EC point. SPKI and PKCS#8
//! documents are parsed with the `spki`/`pkcs8` crates and then loaded by
//! the curve or `dsa` crate, which validates the key material. Only the
//! certificate envelope is walked by hand to reach its SPKI.

use crate::algorithm::{EcCurve, KeyAlgorithm};
use crate::error::{UicError, UicResult};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{DecodePrivateKey, PrivateKeyInfo};
use spki::{DecodePublicKey, SubjectPublicKeyInfoRef};
use uic_asn1::der::{DerDecoder, DerTagClass};

macro_rules! ec_point_from_spki {
    ($curve:ident, $der:expr) => {
        $curve::PublicKey::from_public_key_der($der)
            .map(|key| key.to_encoded_point(false).as_bytes().to_vec())
            .map_err(|e| UicError::InvalidPublicKey(format!("Invalid EC public key: {}", e)))
    };
}

macro_rules! ec_point_check {
    ($curve:ident, $point:expr) => {
        $curve::PublicKey::from_sec1_bytes($point)
            .map(|_| ())
            .map_err(|e| UicError::InvalidPublicKey(format!("Invalid EC point: {}", e)))
    };
}

macro_rules! ec_scalar_from_pkcs8 {
    ($curve:ident, $der:expr) => {
        $curve::SecretKey::from_pkcs8_der($der)
            .map(|key| key.to_bytes().to_vec())
            .map_err(|e| UicError::InvalidPrivateKey(format!("Invalid EC private key: {}", e)))
    };
}

/// Parsed verification key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// EC key with its uncompressed SEC1 point
    Ec { curve: EcCurve, point: Vec<u8> },
    /// DSA key kept as SubjectPublicKeyInfo DER
    Dsa { spki: Vec<u8> },
}

impl PublicKey {
    /// Parse a public key from SPKI DER, certificate DER or a raw EC point
    ///
    /// # Error Handling
    /// Returns `InvalidPublicKey` when none of the accepted shapes match, the
    /// key algorithm is unknown or the key material is rejected.
    pub fn from_bytes(bytes: &[u8]) -> UicResult<Self> {
        if bytes.first() == Some(&0x04) {
            if let Some(curve) = EcCurve::from_point_len(bytes.len()) {
                match curve {
                    EcCurve::P256 => ec_point_check!(p256, bytes)?,
                    EcCurve::P384 => ec_point_check!(p384, bytes)?,
                    EcCurve::P521 => ec_point_check!(p521, bytes)?,
                }
                return Ok(PublicKey::Ec {
                    curve,
                    point: bytes.to_vec(),
                });
            }
        }

        if SubjectPublicKeyInfoRef::try_from(bytes).is_ok() {
            return Self::from_spki(bytes);
        }
        let spki = find_certificate_spki(bytes)
            .map_err(|e| UicError::InvalidPublicKey(format!("Unrecognized key encoding: {}", e)))?;
        Self::from_spki(spki)
    }

    /// Parse a SubjectPublicKeyInfo DER document
    pub fn from_spki(spki: &[u8]) -> UicResult<Self> {
        let info = SubjectPublicKeyInfoRef::try_from(spki)
            .map_err(|e| UicError::InvalidPublicKey(format!("Invalid SubjectPublicKeyInfo: {}", e)))?;
        let algorithm = info.algorithm.oid.to_string();

        match KeyAlgorithm::from_oid(&algorithm) {
            Some(KeyAlgorithm::Ec) => {
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .ok()
                    .and_then(|oid| EcCurve::from_oid(&oid.to_string()))
                    .ok_or_else(|| {
                        UicError::InvalidPublicKey("Unsupported or missing EC curve".to_string())
                    })?;
                let point = match curve {
                    EcCurve::P256 => ec_point_from_spki!(p256, spki)?,
                    EcCurve::P384 => ec_point_from_spki!(p384, spki)?,
                    EcCurve::P521 => ec_point_from_spki!(p521, spki)?,
                };
                Ok(PublicKey::Ec { curve, point })
            }
            Some(KeyAlgorithm::Dsa) => {
                dsa::VerifyingKey::from_public_key_der(spki)
                    .map_err(|e| UicError::InvalidPublicKey(format!("Invalid DSA key: {}", e)))?;
                Ok(PublicKey::Dsa {
                    spki: spki.to_vec(),
                })
            }
            None => Err(UicError::InvalidPublicKey(format!(
                "Unsupported key algorithm {}",
                algorithm
            ))),
        }
    }

    /// Key algorithm of this key
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Ec { .. } => KeyAlgorithm::Ec,
            PublicKey::Dsa { .. } => KeyAlgorithm::Dsa,
        }
    }
}

/// Parsed signing key
#[derive(Clone, PartialEq, Eq)]
pub enum PrivateKey {
    /// EC key with its big-endian secret scalar
    Ec { curve: EcCurve, scalar: Vec<u8> },
    /// DSA key kept as PKCS#8 DER
    Dsa { pkcs8: Vec<u8> },
}

impl PrivateKey {
    /// Parse a PKCS#8 `PrivateKeyInfo` DER document
    ///
    /// EC keys must name their curve in the algorithm parameters.
    pub fn from_pkcs8_der(bytes: &[u8]) -> UicResult<Self> {
        let info = PrivateKeyInfo::try_from(bytes)
            .map_err(|e| UicError::InvalidPrivateKey(format!("Invalid PKCS#8 document: {}", e)))?;
        let algorithm = info.algorithm.oid.to_string();

        match KeyAlgorithm::from_oid(&algorithm) {
            Some(KeyAlgorithm::Ec) => {
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .ok()
                    .and_then(|oid| EcCurve::from_oid(&oid.to_string()))
                    .ok_or_else(|| {
                        UicError::InvalidPrivateKey("Unsupported or missing EC curve".to_string())
                    })?;
                let scalar = match curve {
                    EcCurve::P256 => ec_scalar_from_pkcs8!(p256, bytes)?,
                    EcCurve::P384 => ec_scalar_from_pkcs8!(p384, bytes)?,
                    EcCurve::P521 => ec_scalar_from_pkcs8!(p521, bytes)?,
                };
                Ok(PrivateKey::Ec { curve, scalar })
            }
            Some(KeyAlgorithm::Dsa) => {
                dsa::SigningKey::from_pkcs8_der(bytes)
                    .map_err(|e| UicError::InvalidPrivateKey(format!("Invalid DSA key: {}", e)))?;
                Ok(PrivateKey::Dsa {
                    pkcs8: bytes.to_vec(),
                })
            }
            None => Err(UicError::InvalidPrivateKey(format!(
                "Unsupported key algorithm {}",
                algorithm
            ))),
        }
    }

    /// Key algorithm of this key
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Ec { .. } => KeyAlgorithm::Ec,
            PrivateKey::Dsa { .. } => KeyAlgorithm::Dsa,
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrivateKey::Ec { curve, .. } => f.debug_struct("Ec").field("curve", curve).finish_non_exhaustive(),
            PrivateKey::Dsa { .. } => f.debug_struct("Dsa").finish_non_exhaustive(),
        }
    }
}

/// Locate the SubjectPublicKeyInfo inside certificate DER
///
/// `Certificate ::= SEQUENCE { tbsCertificate, ... }`; the SPKI is the
/// seventh field of `tbsCertificate` (sixth without the explicit version).
fn find_certificate_spki(bytes: &[u8]) -> UicResult<&[u8]> {
    let mut outer = DerDecoder::new(bytes);
    let content = outer.decode_sequence()?;
    let mut fields = DerDecoder::new(content);
    let tbs_content = fields.decode_sequence()?;

    let mut tbs = DerDecoder::new(tbs_content);
    let tag = tbs.peek_tag()?;
    if tag.class() == DerTagClass::ContextSpecific && tag.number() == 0 {
        tbs.skip_tlv()?;
    }
    // serialNumber, signature, issuer, validity, subject
    for _ in 0..5 {
        tbs.skip_tlv()?;
    }
    let start = tbs.position();
    tbs.decode_sequence()?;
    Ok(&tbs_content[start..tbs.position()])
}
