//! Signature validation with a closed result set
//!
//! A signature that does not verify is an expected outcome for a barcode
//! reader, so validation reports a result code instead of an error.

use crate::algorithm::SigningAlgorithm;
use crate::crypto::verify;
use crate::error::UicError;
use crate::keys::PublicKey;
use std::fmt;

/// Outcome of validating a barcode signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureValidationResult {
    /// Signature verifies over the signed data
    Valid,
    /// Signature present and well formed but does not verify
    Invalid,
    /// No signature in the barcode
    SignatureMissing,
    /// No public key supplied or embedded
    PublicKeyMissing,
    /// Algorithm OID unknown, or no algorithm could be derived
    AlgorithmMissing,
    /// Signed data could not be located
    SignedDataMissing,
    /// Public key could not be parsed or does not fit the algorithm
    PublicKeyInvalid,
    /// Signed data could not be re-encoded
    EncodingError,
}

impl SignatureValidationResult {
    /// Check if the signature verified
    pub fn is_valid(&self) -> bool {
        matches!(self, SignatureValidationResult::Valid)
    }
}

impl fmt::Display for SignatureValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignatureValidationResult::Valid => "valid",
            SignatureValidationResult::Invalid => "invalid",
            SignatureValidationResult::SignatureMissing => "signature missing",
            SignatureValidationResult::PublicKeyMissing => "public key missing",
            SignatureValidationResult::AlgorithmMissing => "algorithm missing",
            SignatureValidationResult::SignedDataMissing => "signed data missing",
            SignatureValidationResult::PublicKeyInvalid => "public key invalid",
            SignatureValidationResult::EncodingError => "encoding error",
        };
        f.write_str(text)
    }
}

/// Validate a DER signature over `signed_data`
///
/// # Arguments
/// * `signature` - DER signature, if the barcode carries one
/// * `signed_data` - Exact bytes that were signed
/// * `public_key` - SPKI DER, certificate DER or raw EC point
/// * `algorithm_oid` - Signing algorithm OID; when absent the algorithm is
///   derived from the key type (DSA hash from the signature length)
pub fn validate_signature(
    signature: Option<&[u8]>,
    signed_data: Option<&[u8]>,
    public_key: Option<&[u8]>,
    algorithm_oid: Option<&str>,
) -> SignatureValidationResult {
    let Some(signature) = signature.filter(|s| !s.is_empty()) else {
        return SignatureValidationResult::SignatureMissing;
    };
    let Some(signed_data) = signed_data else {
        return SignatureValidationResult::SignedDataMissing;
    };
    let Some(public_key) = public_key.filter(|k| !k.is_empty()) else {
        return SignatureValidationResult::PublicKeyMissing;
    };

    let explicit = match algorithm_oid.map(str::trim).filter(|oid| !oid.is_empty()) {
        Some(oid) => match SigningAlgorithm::from_oid(oid) {
            Some(algorithm) => Some(algorithm),
            None => {
                log::debug!("Unknown signing algorithm OID {}", oid);
                return SignatureValidationResult::AlgorithmMissing;
            }
        },
        None => None,
    };

    let key = match PublicKey::from_bytes(public_key) {
        Ok(key) => key,
        Err(e) => {
            log::debug!("Public key rejected: {}", e);
            return SignatureValidationResult::PublicKeyInvalid;
        }
    };
    let algorithm =
        explicit.unwrap_or_else(|| key.key_algorithm().default_signing_algorithm(signature.len()));

    match verify(signature, signed_data, &key, algorithm) {
        Ok(true) => SignatureValidationResult::Valid,
        Ok(false) => SignatureValidationResult::Invalid,
        Err(UicError::InvalidPublicKey(message)) => {
            log::debug!("Public key unusable for {}: {}", algorithm, message);
            SignatureValidationResult::PublicKeyInvalid
        }
        Err(e) => {
            log::debug!("Signature verification failed: {}", e);
            SignatureValidationResult::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{EcCurve, HashAlgorithm, OID_DSA_SHA1, OID_ECDSA_SHA256};
    use crate::crypto::sign;
    use crate::keys::PrivateKey;
    use pkcs8::EncodePrivateKey;
    use rand::rngs::OsRng;
    use spki::EncodePublicKey;

    fn p256_keys() -> (PrivateKey, Vec<u8>) {
        let scalar = vec![0x33u8; 32];
        let point = p256::ecdsa::SigningKey::from_slice(&scalar)
            .unwrap()
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        (
            PrivateKey::Ec {
                curve: EcCurve::P256,
                scalar,
            },
            point,
        )
    }

    #[test]
    fn test_valid_and_invalid() {
        let (private_key, public_key) = p256_keys();
        let signature = sign(
            b"signed",
            &private_key,
            SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256),
        )
        .unwrap();

        let result = validate_signature(
            Some(signature.as_slice()),
            Some(&b"signed"[..]),
            Some(public_key.as_slice()),
            Some(OID_ECDSA_SHA256),
        );
        assert_eq!(result, SignatureValidationResult::Valid);

        // algorithm derived from the EC key
        let result = validate_signature(
            Some(signature.as_slice()),
            Some(&b"signed"[..]),
            Some(public_key.as_slice()),
            None,
        );
        assert!(result.is_valid());

        let result = validate_signature(
            Some(signature.as_slice()),
            Some(&b"signeD"[..]),
            Some(public_key.as_slice()),
            None,
        );
        assert_eq!(result, SignatureValidationResult::Invalid);
    }

    #[test]
    fn test_unknown_algorithm_is_not_invalid() {
        let (private_key, public_key) = p256_keys();
        let signature = sign(
            b"signed",
            &private_key,
            SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256),
        )
        .unwrap();
        let result = validate_signature(
            Some(signature.as_slice()),
            Some(&b"signed"[..]),
            Some(public_key.as_slice()),
            Some("1.2.3.4.5"),
        );
        assert_eq!(result, SignatureValidationResult::AlgorithmMissing);
    }

    #[test]
    fn test_missing_inputs() {
        assert_eq!(
            validate_signature(None, Some(&b"x"[..]), Some(&[4u8][..]), None),
            SignatureValidationResult::SignatureMissing
        );
        assert_eq!(
            validate_signature(Some(&[0x30u8][..]), None, Some(&[4u8][..]), None),
            SignatureValidationResult::SignedDataMissing
        );
        assert_eq!(
            validate_signature(Some(&[0x30u8][..]), Some(&b"x"[..]), Some(&[][..]), None),
            SignatureValidationResult::PublicKeyMissing
        );
        assert_eq!(
            validate_signature(Some(&[0x30u8][..]), Some(&b"x"[..]), Some(&[1u8, 2, 3][..]), None),
            SignatureValidationResult::PublicKeyInvalid
        );
    }

    #[test]
    #[allow(deprecated)]
    fn test_dsa_hash_detected_from_signature_length() {
        let components = dsa::Components::generate(&mut OsRng, dsa::KeySize::DSA_1024_160);
        let signing_key = dsa::SigningKey::generate(&mut OsRng, components);
        let public_der = signing_key
            .verifying_key()
            .to_public_key_der()
            .unwrap()
            .as_bytes()
            .to_vec();
        let private_der = signing_key.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let private_key = PrivateKey::from_pkcs8_der(&private_der).unwrap();

        let signature = sign(
            b"static frame payload",
            &private_key,
            SigningAlgorithm::parse_oid(OID_DSA_SHA1).unwrap(),
        )
        .unwrap();
        assert!(signature.len() <= 48);

        let result = validate_signature(
            Some(signature.as_slice()),
            Some(&b"static frame payload"[..]),
            Some(public_der.as_slice()),
            None,
        );
        assert_eq!(result, SignatureValidationResult::Valid);
    }
}
