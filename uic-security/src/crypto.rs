//! DSA/ECDSA sign and verify dispatch
//!
//! ECDSA runs on prehashed input so the digest follows the algorithm OID,
//! not the curve. DSA goes through `DigestSigner`/`DigestVerifier` with the
//! matching `sha1`/`sha2` hasher.

use crate::algorithm::{EcCurve, HashAlgorithm, SigningAlgorithm};
use crate::error::{UicError, UicResult};
use crate::keys::{PrivateKey, PublicKey};
use crate::signature::{der_to_raw, normalize_der, raw_to_der, split_raw};
use pkcs8::DecodePrivateKey;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use signature::hazmat::{PrehashSigner, PrehashVerifier};
use signature::{DigestSigner, DigestVerifier, SignatureEncoding};
use spki::DecodePublicKey;

macro_rules! ecdsa_verify {
    ($curve:ident, $point:expr, $raw:expr, $prehash:expr) => {{
        let key = $curve::ecdsa::VerifyingKey::from_sec1_bytes($point)
            .map_err(|e| UicError::InvalidPublicKey(format!("Invalid EC point: {}", e)))?;
        match $curve::ecdsa::Signature::from_slice($raw) {
            Ok(signature) => key.verify_prehash($prehash, &signature).is_ok(),
            // r or s out of range can never verify
            Err(_) => false,
        }
    }};
}

macro_rules! ecdsa_sign {
    ($curve:ident, $scalar:expr, $prehash:expr) => {{
        let key = $curve::ecdsa::SigningKey::from_slice($scalar)
            .map_err(|e| UicError::InvalidPrivateKey(format!("Invalid EC scalar: {}", e)))?;
        let signature: $curve::ecdsa::Signature = key
            .sign_prehash($prehash)
            .map_err(|e| UicError::Signature(format!("ECDSA signing failed: {}", e)))?;
        signature.to_bytes().to_vec()
    }};
}

/// Verify a DER signature over `data`
///
/// # Returns
/// `Ok(true)` if the signature verifies, `Ok(false)` if it is well formed
/// but does not match.
///
/// # Error Handling
/// - `InvalidDer` if the signature is not a DER `(r, s)` pair
/// - `InvalidPublicKey` if the key cannot be loaded or does not fit the
///   algorithm
pub fn verify(
    signature: &[u8],
    data: &[u8],
    public_key: &PublicKey,
    algorithm: SigningAlgorithm,
) -> UicResult<bool> {
    match (algorithm, public_key) {
        (SigningAlgorithm::Ecdsa(hash), PublicKey::Ec { curve, point }) => {
            let raw = der_to_raw(signature, curve.field_len())?;
            let prehash = field_prehash(hash, data, *curve);
            Ok(match curve {
                EcCurve::P256 => ecdsa_verify!(p256, point, &raw, &prehash),
                EcCurve::P384 => ecdsa_verify!(p384, point, &raw, &prehash),
                EcCurve::P521 => ecdsa_verify!(p521, point, &raw, &prehash),
            })
        }
        (SigningAlgorithm::Dsa(hash), PublicKey::Dsa { spki }) => {
            let key = dsa::VerifyingKey::from_public_key_der(spki)
                .map_err(|e| UicError::InvalidPublicKey(format!("Invalid DSA key: {}", e)))?;
            let der = normalize_der(signature)?;
            let Ok(signature) = dsa::Signature::try_from(der.as_slice()) else {
                return Ok(false);
            };
            let verified = match hash {
                HashAlgorithm::Sha1 => key.verify_digest(Sha1::new_with_prefix(data), &signature),
                HashAlgorithm::Sha224 => key.verify_digest(Sha224::new_with_prefix(data), &signature),
                HashAlgorithm::Sha256 => key.verify_digest(Sha256::new_with_prefix(data), &signature),
                HashAlgorithm::Sha384 => key.verify_digest(Sha384::new_with_prefix(data), &signature),
                HashAlgorithm::Sha512 => key.verify_digest(Sha512::new_with_prefix(data), &signature),
            };
            Ok(verified.is_ok())
        }
        (algorithm, key) => Err(UicError::InvalidPublicKey(format!(
            "{:?} key cannot verify {}",
            key.key_algorithm(),
            algorithm
        ))),
    }
}

/// Sign `data`, returning a canonical DER signature
///
/// ECDSA signatures are deterministic (RFC 6979); DSA signatures use the
/// `dsa` crate's deterministic nonce as well.
pub fn sign(data: &[u8], private_key: &PrivateKey, algorithm: SigningAlgorithm) -> UicResult<Vec<u8>> {
    match (algorithm, private_key) {
        (SigningAlgorithm::Ecdsa(hash), PrivateKey::Ec { curve, scalar }) => {
            let prehash = field_prehash(hash, data, *curve);
            let raw = match curve {
                EcCurve::P256 => ecdsa_sign!(p256, scalar, &prehash),
                EcCurve::P384 => ecdsa_sign!(p384, scalar, &prehash),
                EcCurve::P521 => ecdsa_sign!(p521, scalar, &prehash),
            };
            let (r, s) = split_raw(&raw)?;
            raw_to_der(r, s)
        }
        (SigningAlgorithm::Dsa(hash), PrivateKey::Dsa { pkcs8 }) => {
            let key = dsa::SigningKey::from_pkcs8_der(pkcs8)
                .map_err(|e| UicError::InvalidPrivateKey(format!("Invalid DSA key: {}", e)))?;
            let signature = match hash {
                HashAlgorithm::Sha1 => key.try_sign_digest(Sha1::new_with_prefix(data)),
                HashAlgorithm::Sha224 => key.try_sign_digest(Sha224::new_with_prefix(data)),
                HashAlgorithm::Sha256 => key.try_sign_digest(Sha256::new_with_prefix(data)),
                HashAlgorithm::Sha384 => key.try_sign_digest(Sha384::new_with_prefix(data)),
                HashAlgorithm::Sha512 => key.try_sign_digest(Sha512::new_with_prefix(data)),
            }
            .map_err(|e| UicError::Signature(format!("DSA signing failed: {}", e)))?;
            normalize_der(&signature.to_vec())
        }
        (algorithm, key) => Err(UicError::InvalidPrivateKey(format!(
            "{:?} key cannot sign {}",
            key.key_algorithm(),
            algorithm
        ))),
    }
}

/// Digest of `data`, left-padded to the curve's field size when shorter
///
/// Padding keeps the integer value of the digest unchanged; it only lifts
/// short digests (SHA-256 on P-521) over the minimum prehash size.
fn field_prehash(hash: HashAlgorithm, data: &[u8], curve: EcCurve) -> Vec<u8> {
    let digest = hash.digest(data);
    let field_len = curve.field_len();
    if digest.len() >= field_len {
        return digest;
    }
    let mut padded = vec![0u8; field_len - digest.len()];
    padded.extend_from_slice(&digest);
    padded
}
