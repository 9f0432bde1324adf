//! Decoded barcode and its signature view

use crate::error::{UicError, UicResult};
use crate::options::DecodeOptions;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uic_core::FrameType;
use uic_frame::{DynamicFrame, FcbTicket, SsbFrame, StaticFrame, TicketCodec};
use uic_security::{SignatureValidationResult, validate_signature};

/// One of the three concrete frames
#[derive(Debug, Clone)]
pub enum Frame {
    Static(StaticFrame),
    Dynamic(DynamicFrame),
    Ssb(SsbFrame),
}

impl Frame {
    /// Classification of this frame with its version
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Static(frame) => FrameType::StaticFrame {
                version: frame.version,
            },
            Frame::Dynamic(frame) => FrameType::DynamicFrame {
                version: Some(frame.version.number()),
            },
            Frame::Ssb(_) => FrameType::SsbFrame,
        }
    }

    /// Encode to barcode bytes
    pub fn encode(&self, codec: &dyn TicketCodec) -> UicResult<Vec<u8>> {
        match self {
            Frame::Static(frame) => frame.encode(codec),
            Frame::Dynamic(frame) => frame.encode(),
            Frame::Ssb(frame) => frame.encode(),
        }
    }
}

/// Signature fields normalized across frame formats
///
/// `signed_data` holds exactly the bytes the issuer signed: the compressed
/// payload of a Static Frame, the level-1 encoding of a Dynamic Frame, the
/// first 58 bytes of an SSB frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureData {
    /// DER signature
    pub signature: Option<Vec<u8>>,
    pub security_provider_num: Option<i64>,
    pub security_provider_ia5: Option<String>,
    pub key_id: Option<String>,
    /// Signing algorithm OID (Dynamic Frame only)
    pub algorithm_oid: Option<String>,
    /// Public key embedded in the barcode (Dynamic Frame level-2 key)
    pub public_key: Option<Vec<u8>>,
    pub signed_data: Option<Vec<u8>>,
}

impl SignatureData {
    fn from_static(frame: &StaticFrame) -> Self {
        Self {
            signature: non_empty(&frame.signature),
            security_provider_ia5: Some(frame.resolved_security_provider()).filter(|p| !p.is_empty()),
            key_id: Some(frame.signature_key_id.clone()).filter(|k| !k.is_empty()),
            signed_data: frame.signed_data().map(<[u8]>::to_vec),
            ..Default::default()
        }
    }

    fn from_dynamic(frame: &DynamicFrame) -> Self {
        let level1 = frame.level1_data();
        let signed_data = match frame.level1_signed_bytes() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Level 1 signed data unavailable: {}", e);
                None
            }
        };
        Self {
            signature: frame.level1_signature().and_then(non_empty),
            security_provider_num: level1.security_provider_num,
            security_provider_ia5: level1.security_provider_ia5.clone(),
            key_id: level1.key_id.map(|id| id.to_string()),
            algorithm_oid: level1.level1_signing_algorithm.as_ref().map(|oid| oid.to_string()),
            public_key: level1.level2_public_key.clone(),
            signed_data,
        }
    }

    fn from_ssb(frame: &SsbFrame) -> Self {
        Self {
            signature: non_empty(&frame.signature),
            security_provider_num: Some(i64::from(frame.issuer)),
            key_id: Some(frame.key_id.to_string()),
            signed_data: frame.signed_data().ok(),
            ..Default::default()
        }
    }
}

fn non_empty(bytes: &[u8]) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then(|| bytes.to_vec())
}

/// Result of decoding a barcode
#[derive(Debug, Clone)]
pub struct DecodedBarcode {
    pub frame_type: FrameType,
    /// FCB ticket, if the frame carries one
    pub ticket: Option<FcbTicket>,
    pub fcb_version: Option<u8>,
    pub signature: SignatureData,
    pub frame: Frame,
    reference_date: NaiveDate,
}

impl DecodedBarcode {
    /// Build the normalized view over a decoded frame
    pub fn from_frame(frame: Frame, options: &DecodeOptions) -> UicResult<Self> {
        let (signature, ticket) = match &frame {
            Frame::Static(inner) => (
                SignatureData::from_static(inner),
                inner.flex.as_ref().map(|flex| flex.ticket.clone()),
            ),
            Frame::Dynamic(inner) => (
                SignatureData::from_dynamic(inner),
                inner.fcb_ticket(options.ticket_codec.as_ref())?,
            ),
            Frame::Ssb(inner) => (SignatureData::from_ssb(inner), None),
        };
        Ok(Self {
            frame_type: frame.frame_type(),
            fcb_version: ticket.as_ref().map(|t| t.version),
            ticket,
            signature,
            frame,
            reference_date: options.effective_reference_date(),
        })
    }

    /// Validate the issuer signature (Static, SSB, Dynamic level 1)
    ///
    /// # Arguments
    /// * `public_key` - Issuer key as SPKI, certificate or raw EC point
    /// * `algorithm_oid` - Overrides the algorithm named in the barcode
    pub fn validate_signature(
        &self,
        public_key: Option<&[u8]>,
        algorithm_oid: Option<&str>,
    ) -> SignatureValidationResult {
        if self.signature.signature.is_some() && self.signature.signed_data.is_none() {
            return SignatureValidationResult::EncodingError;
        }
        validate_signature(
            self.signature.signature.as_deref(),
            self.signature.signed_data.as_deref(),
            public_key,
            algorithm_oid.or(self.signature.algorithm_oid.as_deref()),
        )
    }

    /// Validate the level-2 signature of a Dynamic Frame with its embedded key
    ///
    /// Frames without a level 2 report `SignatureMissing`.
    pub fn validate_level2(&self) -> SignatureValidationResult {
        let Frame::Dynamic(frame) = &self.frame else {
            return SignatureValidationResult::SignatureMissing;
        };
        let Some(signature) = frame.level2_signature.as_deref() else {
            return SignatureValidationResult::SignatureMissing;
        };
        let signed_data = match frame.level2_signed_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Level 2 signed data could not be encoded: {}", e);
                return SignatureValidationResult::EncodingError;
            }
        };
        let level1 = frame.level1_data();
        let algorithm = level1.level2_signing_algorithm.as_ref().map(|oid| oid.to_string());
        validate_signature(
            Some(signature),
            Some(&signed_data),
            level1.level2_public_key.as_deref(),
            algorithm.as_deref(),
        )
    }

    /// Dynamic content timestamp resolved against the reference date
    pub fn dynamic_content_time(&self) -> Option<UicResult<NaiveDateTime>> {
        let Frame::Dynamic(frame) = &self.frame else {
            return None;
        };
        let stamp = frame.dynamic_content()?.time_stamp?;
        Some(stamp.to_date_time(self.reference_date))
    }

    /// Security provider of the frame, as text
    pub fn security_provider(&self) -> UicResult<String> {
        self.signature
            .security_provider_ia5
            .clone()
            .or_else(|| self.signature.security_provider_num.map(|n| n.to_string()))
            .ok_or_else(|| UicError::InvalidData("Barcode names no security provider".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uic_frame::dynamic_frame::{DataType, DynamicFrameVersion, Level1Data, Level2Content};
    use uic_frame::{TimeStamp, UicDynamicContent};
    use uic_security::{EcCurve, HashAlgorithm, PrivateKey, SigningAlgorithm};

    fn key(byte: u8) -> (PrivateKey, Vec<u8>) {
        let scalar = vec![byte; 32];
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

    fn signed_dynamic() -> (DynamicFrame, Vec<u8>) {
        let (level1_key, level1_point) = key(0x11);
        let (level2_key, level2_point) = key(0x33);
        let algorithm = SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256);

        let level1 = Level1Data {
            security_provider_num: Some(1080),
            key_id: Some(4),
            data_sequence: vec![DataType::new("FCB3", vec![0x0F; 8])],
            level2_public_key: Some(level2_point),
            level2_signing_algorithm: Some(algorithm.oid().unwrap().parse().unwrap()),
            ..Default::default()
        };
        let mut frame = DynamicFrame::new(DynamicFrameVersion::V2, level1);
        frame.sign_level1(&level1_key, algorithm).unwrap();
        frame.level2_signed_data_mut().level2_data = Some(Level2Content::Dynamic(UicDynamicContent {
            time_stamp: Some(TimeStamp { day: 365, time: 0 }),
            ..Default::default()
        }));
        frame.sign_level2(&level2_key, algorithm).unwrap();
        (frame, level1_point)
    }

    #[test]
    fn test_dynamic_signature_view() {
        let (frame, level1_point) = signed_dynamic();
        let decoded = DecodedBarcode::from_frame(Frame::Dynamic(frame), &DecodeOptions::default()).unwrap();

        assert_eq!(decoded.frame_type, FrameType::DynamicFrame { version: Some(2) });
        assert_eq!(decoded.fcb_version, Some(3));
        assert_eq!(decoded.signature.key_id.as_deref(), Some("4"));
        assert_eq!(decoded.signature.algorithm_oid.as_deref(), Some("1.2.840.10045.4.3.2"));
        assert_eq!(decoded.security_provider().unwrap(), "1080");

        assert_eq!(
            decoded.validate_signature(Some(&level1_point), None),
            SignatureValidationResult::Valid
        );
        assert_eq!(decoded.validate_level2(), SignatureValidationResult::Valid);
        assert_eq!(
            decoded.validate_signature(None, None),
            SignatureValidationResult::PublicKeyMissing
        );
    }

    #[test]
    fn test_wrong_key_and_unknown_algorithm() {
        let (frame, _) = signed_dynamic();
        let (_, other_point) = key(0x55);
        let decoded = DecodedBarcode::from_frame(Frame::Dynamic(frame), &DecodeOptions::default()).unwrap();
        assert_eq!(
            decoded.validate_signature(Some(&other_point), None),
            SignatureValidationResult::Invalid
        );
        assert_eq!(
            decoded.validate_signature(Some(&other_point), Some("1.2.3.4")),
            SignatureValidationResult::AlgorithmMissing
        );
    }

    #[test]
    fn test_timestamp_uses_reference_date() {
        let (frame, _) = signed_dynamic();
        let options = DecodeOptions::default().with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        let decoded = DecodedBarcode::from_frame(Frame::Dynamic(frame), &options).unwrap();
        let time = decoded.dynamic_content_time().unwrap().unwrap();
        assert_eq!(time.date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_unsigned_static_frame() {
        let frame = StaticFrame::new(1, "1080", "00001");
        let decoded = DecodedBarcode::from_frame(Frame::Static(frame), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.frame_type, FrameType::StaticFrame { version: 1 });
        assert_eq!(decoded.security_provider().unwrap(), "1080");
        assert!(decoded.ticket.is_none());
        assert_eq!(
            decoded.validate_signature(Some(&[0x04; 65]), None),
            SignatureValidationResult::SignatureMissing
        );
        assert_eq!(decoded.validate_level2(), SignatureValidationResult::SignatureMissing);
        assert!(decoded.dynamic_content_time().is_none());
    }
}
