//! Dynamic Frame (`U1` / `U2`) decoder and encoder
//!
//! ```text
//! UicBarcodeHeader ::= SEQUENCE {
//!     format           IA5String,
//!     level2SignedData Level2DataType,
//!     level2Signature  OCTET STRING OPTIONAL
//! }
//! ```
//!
//! # Signed Data
//!
//! The level-1 signature covers the encoding of `level1Data`, the level-2
//! signature covers the encoding of `level2SignedData`. On decode both bit
//! ranges are copied out of the input as standalone encodings, so foreign
//! encoder quirks survive verification.

use crate::dynamic_frame::content::UicDynamicContent;
use crate::dynamic_frame::level1::Level1Data;
use crate::dynamic_frame::level2::Level2Data;
use crate::error::{UicError, UicResult};
use crate::ticket::{FcbTicket, TicketCodec, fcb_version_from_format};
use uic_asn1::ObjectIdentifier;
use uic_asn1::uper::{UperDecoder, UperEncoder};
use uic_security::{PrivateKey, SigningAlgorithm};

/// Dynamic Frame schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicFrameVersion {
    V1,
    V2,
}

impl DynamicFrameVersion {
    /// Format token written at the start of the frame
    pub fn format(&self) -> &'static str {
        match self {
            DynamicFrameVersion::V1 => "U1",
            DynamicFrameVersion::V2 => "U2",
        }
    }

    /// Version for a format token
    pub fn from_format(format: &str) -> Option<Self> {
        match format {
            "U1" => Some(DynamicFrameVersion::V1),
            "U2" => Some(DynamicFrameVersion::V2),
            _ => None,
        }
    }

    /// Version number (1 or 2)
    pub fn number(&self) -> u8 {
        match self {
            DynamicFrameVersion::V1 => 1,
            DynamicFrameVersion::V2 => 2,
        }
    }

    /// OPTIONAL fields of `Level1DataType` in this schema
    pub fn level1_optional_fields(&self) -> usize {
        match self {
            DynamicFrameVersion::V1 => 8,
            DynamicFrameVersion::V2 => 12,
        }
    }
}

/// A Dynamic Frame
///
/// Signed-data bytes captured on decode are dropped as soon as the signed
/// structure is borrowed mutably; from then on they are re-encoded.
#[derive(Debug, Clone)]
pub struct DynamicFrame {
    pub version: DynamicFrameVersion,
    level2_signed_data: Level2Data,
    /// DER signature over the level-2 signed data
    pub level2_signature: Option<Vec<u8>>,
    level1_encoded: Option<Vec<u8>>,
    level2_encoded: Option<Vec<u8>>,
}

impl DynamicFrame {
    /// Create an unsigned frame around `level1_data`
    pub fn new(version: DynamicFrameVersion, level1_data: Level1Data) -> Self {
        Self {
            version,
            level2_signed_data: Level2Data::new(level1_data),
            level2_signature: None,
            level1_encoded: None,
            level2_encoded: None,
        }
    }

    pub fn level2_signed_data(&self) -> &Level2Data {
        &self.level2_signed_data
    }

    /// Mutable access to the signed structure; forgets captured bytes
    pub fn level2_signed_data_mut(&mut self) -> &mut Level2Data {
        self.level1_encoded = None;
        self.level2_encoded = None;
        &mut self.level2_signed_data
    }

    pub fn level1_data(&self) -> &Level1Data {
        &self.level2_signed_data.level1_data
    }

    /// Mutable access to level 1; forgets captured bytes
    pub fn level1_data_mut(&mut self) -> &mut Level1Data {
        &mut self.level2_signed_data_mut().level1_data
    }

    pub fn level1_signature(&self) -> Option<&[u8]> {
        self.level2_signed_data.level1_signature.as_deref()
    }

    /// Parsed `FDC1` content carried in level 2
    pub fn dynamic_content(&self) -> Option<&UicDynamicContent> {
        self.level2_signed_data.dynamic_content()
    }

    /// Decode a Dynamic Frame, trying the `U2` schema first, then `U1`
    pub fn decode(data: &[u8]) -> UicResult<Self> {
        match Self::decode_version(data, DynamicFrameVersion::V2) {
            Ok(frame) => Ok(frame),
            Err(v2_error) => {
                log::debug!("Not a U2 dynamic frame ({}), trying U1", v2_error);
                Self::decode_version(data, DynamicFrameVersion::V1)
            }
        }
    }

    /// Decode a Dynamic Frame in one schema version
    ///
    /// # Error Handling
    /// Returns `InvalidHeader` if the format token is not the one of
    /// `version`, or the structural error of the first malformed field.
    pub fn decode_version(data: &[u8], version: DynamicFrameVersion) -> UicResult<Self> {
        let mut decoder = UperDecoder::new(data);
        let present = decoder.decode_presence_bitmap(1)?;
        let format = decoder.decode_ia5_string()?;
        if format != version.format() {
            return Err(UicError::InvalidHeader(format!(
                "Dynamic frame format '{}' is not {}",
                format.escape_debug(),
                version.format()
            )));
        }

        let level2_start = decoder.position();
        let (level2_signed_data, level1_span) = Level2Data::decode_spanned(&mut decoder, version)?;
        let level2_end = decoder.position();
        let level2_signature = present[0].then(|| decoder.decode_octet_string()).transpose()?;

        Ok(Self {
            version,
            level2_signed_data,
            level2_signature,
            level1_encoded: Some(decoder.copy_bits(level1_span.start, level1_span.end)?),
            level2_encoded: Some(decoder.copy_bits(level2_start, level2_end)?),
        })
    }

    /// Encode the frame to barcode bytes
    pub fn encode(&self) -> UicResult<Vec<u8>> {
        let mut encoder = UperEncoder::new();
        encoder.encode_presence_bitmap(&[self.level2_signature.is_some()]);
        encoder.encode_ia5_string(self.version.format())?;
        self.level2_signed_data.encode(&mut encoder, self.version)?;
        if let Some(signature) = &self.level2_signature {
            encoder.encode_octet_string(signature)?;
        }
        Ok(encoder.into_bytes())
    }

    /// Bytes covered by the level-1 signature
    pub fn level1_signed_bytes(&self) -> UicResult<Vec<u8>> {
        if let Some(bytes) = &self.level1_encoded {
            return Ok(bytes.clone());
        }
        let mut encoder = UperEncoder::new();
        self.level2_signed_data.level1_data.encode(&mut encoder, self.version)?;
        Ok(encoder.into_bytes())
    }

    /// Bytes covered by the level-2 signature
    pub fn level2_signed_bytes(&self) -> UicResult<Vec<u8>> {
        if let Some(bytes) = &self.level2_encoded {
            return Ok(bytes.clone());
        }
        let mut encoder = UperEncoder::new();
        self.level2_signed_data.encode(&mut encoder, self.version)?;
        Ok(encoder.into_bytes())
    }

    /// Sign level 1
    ///
    /// Records the key and signing algorithm OIDs in level 1 before signing.
    /// The level-2 algorithms and public key live in level 1 as well and
    /// must be set before this call.
    pub fn sign_level1(&mut self, private_key: &PrivateKey, algorithm: SigningAlgorithm) -> UicResult<()> {
        let key_oid: ObjectIdentifier = algorithm.key_algorithm().oid().parse()?;
        let signing_oid: ObjectIdentifier = algorithm.oid()?.parse()?;
        let level1 = self.level1_data_mut();
        level1.level1_key_algorithm = Some(key_oid);
        level1.level1_signing_algorithm = Some(signing_oid);

        let signed = self.level1_signed_bytes()?;
        let signature = uic_security::sign(&signed, private_key, algorithm)?;
        self.level2_signed_data_mut().level1_signature = Some(signature);
        Ok(())
    }

    /// Sign level 2 (level 1, its signature and the dynamic content)
    pub fn sign_level2(&mut self, private_key: &PrivateKey, algorithm: SigningAlgorithm) -> UicResult<()> {
        let signed = self.level2_signed_bytes()?;
        self.level2_signature = Some(uic_security::sign(&signed, private_key, algorithm)?);
        Ok(())
    }

    /// Decode the FCB ticket carried in level 1, if any
    pub fn fcb_ticket(&self, codec: &dyn TicketCodec) -> UicResult<Option<FcbTicket>> {
        let Some(item) = self.level1_data().fcb_data() else {
            return Ok(None);
        };
        let version = fcb_version_from_format(&item.format).ok_or_else(|| {
            UicError::UnsupportedFormat(format!("Not an FCB data tag: {}", item.format))
        })?;
        codec.decode(&item.data, version).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic_frame::content::{ExtensionData, GeoCoordinate};
    use crate::dynamic_frame::data::DataType;
    use crate::dynamic_frame::level2::Level2Content;
    use crate::dynamic_frame::timestamp::TimeStamp;
    use crate::ticket::{MockTicketCodec, OpaqueTicketCodec};
    use uic_security::{EcCurve, HashAlgorithm, PublicKey};

    fn level1() -> Level1Data {
        Level1Data {
            security_provider_num: Some(1080),
            key_id: Some(1),
            data_sequence: vec![DataType::new("FCB3", vec![0x01, 0x02, 0x03, 0x04])],
            ..Default::default()
        }
    }

    fn p256_key(byte: u8) -> (PrivateKey, PublicKey, Vec<u8>) {
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
            PublicKey::from_bytes(&point).unwrap(),
            point,
        )
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(DynamicFrameVersion::from_format("U2"), Some(DynamicFrameVersion::V2));
        assert_eq!(DynamicFrameVersion::from_format("U3"), None);
        assert_eq!(DynamicFrameVersion::V1.format(), "U1");
        assert_eq!(DynamicFrameVersion::V2.number(), 2);
    }

    #[test]
    fn test_v1_frame_falls_back() {
        let frame = DynamicFrame::new(DynamicFrameVersion::V1, level1());
        let bytes = frame.encode().unwrap();

        let decoded = DynamicFrame::decode(&bytes).unwrap();
        assert_eq!(decoded.version, DynamicFrameVersion::V1);
        assert_eq!(decoded.level2_signed_data(), frame.level2_signed_data());
        assert!(decoded.level2_signature.is_none());
        assert!(matches!(
            DynamicFrame::decode_version(&bytes, DynamicFrameVersion::V2),
            Err(UicError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_v2_roundtrip_with_dynamic_content() {
        let mut data = level1();
        data.end_of_validity_year = Some(2025);
        data.end_of_validity_day = Some(200);
        let mut frame = DynamicFrame::new(DynamicFrameVersion::V2, data);
        frame.level2_signed_data_mut().level2_data = Some(Level2Content::Dynamic(UicDynamicContent {
            mobile_app_id: Some("app".to_string()),
            time_stamp: Some(TimeStamp { day: 199, time: 600 }),
            geo_coordinate: Some(GeoCoordinate::new(7_000_000, 46_000_000)),
            response_to_challenge: None,
            extension: Some(ExtensionData {
                id: "x".to_string(),
                data: vec![9],
            }),
        }));
        frame.level2_signature = Some(vec![0x30, 0x00]);

        let bytes = frame.encode().unwrap();
        let decoded = DynamicFrame::decode(&bytes).unwrap();
        assert_eq!(decoded.version, DynamicFrameVersion::V2);
        assert_eq!(decoded.level2_signed_data(), frame.level2_signed_data());
        assert_eq!(decoded.level2_signature, frame.level2_signature);
        assert_eq!(decoded.dynamic_content().unwrap().mobile_app_id.as_deref(), Some("app"));
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn test_captured_bytes_match_reencoding() {
        let mut frame = DynamicFrame::new(DynamicFrameVersion::V2, level1());
        frame.level2_signed_data_mut().level1_signature = Some(vec![1, 2, 3]);
        let bytes = frame.encode().unwrap();

        let mut decoded = DynamicFrame::decode(&bytes).unwrap();
        assert!(decoded.level1_encoded.is_some());
        assert_eq!(decoded.level1_signed_bytes().unwrap(), frame.level1_signed_bytes().unwrap());
        assert_eq!(decoded.level2_signed_bytes().unwrap(), frame.level2_signed_bytes().unwrap());

        decoded.level1_data_mut().key_id = Some(2);
        assert!(decoded.level1_encoded.is_none());
        assert!(decoded.level2_encoded.is_none());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(DynamicFrame::decode(&[0xFF; 12]).is_err());
        assert!(DynamicFrame::decode(&[]).is_err());
    }

    #[test]
    fn test_sign_both_levels() {
        let (level1_key, level1_public, _) = p256_key(0x11);
        let (level2_key, level2_public, level2_point) = p256_key(0x33);
        let algorithm = SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256);

        let mut data = level1();
        data.level2_public_key = Some(level2_point);
        data.level2_signing_algorithm = Some(algorithm.oid().unwrap().parse().unwrap());
        let mut frame = DynamicFrame::new(DynamicFrameVersion::V2, data);
        frame.sign_level1(&level1_key, algorithm).unwrap();
        frame.level2_signed_data_mut().level2_data = Some(Level2Content::Dynamic(UicDynamicContent {
            time_stamp: Some(TimeStamp { day: 5, time: 5 }),
            ..Default::default()
        }));
        frame.sign_level2(&level2_key, algorithm).unwrap();

        let decoded = DynamicFrame::decode(&frame.encode().unwrap()).unwrap();
        assert_eq!(
            decoded.level1_data().level1_signing_algorithm.as_ref().map(|oid| oid.to_string()),
            Some("1.2.840.10045.4.3.2".to_string())
        );
        assert!(
            uic_security::verify(
                decoded.level1_signature().unwrap(),
                &decoded.level1_signed_bytes().unwrap(),
                &level1_public,
                algorithm
            )
            .unwrap()
        );
        assert!(
            uic_security::verify(
                decoded.level2_signature.as_deref().unwrap(),
                &decoded.level2_signed_bytes().unwrap(),
                &level2_public,
                algorithm
            )
            .unwrap()
        );
    }

    #[test]
    fn test_fcb_ticket() {
        let frame = DynamicFrame::new(DynamicFrameVersion::V1, level1());
        let ticket = frame.fcb_ticket(&OpaqueTicketCodec).unwrap().unwrap();
        assert_eq!(ticket.version, 3);
        assert_eq!(ticket.data, vec![0x01, 0x02, 0x03, 0x04]);

        let mut codec = MockTicketCodec::new();
        codec.expect_decode().never();
        let empty = DynamicFrame::new(
            DynamicFrameVersion::V1,
            Level1Data {
                data_sequence: vec![DataType::new("TEXT", vec![])],
                ..Default::default()
            },
        );
        assert!(empty.fcb_ticket(&codec).unwrap().is_none());
    }
}
