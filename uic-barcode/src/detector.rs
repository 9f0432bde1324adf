//! Frame detection and dispatch
//!
//! # Classification
//!
//! 1. `#UT` prefix: Static Frame, version from the next two digits (1 if
//!    they are missing or not a number)
//! 2. 114 bytes with a version nibble of 1..=3: SSB frame
//! 3. More than 10 bytes: Dynamic Frame, version read by its decoder
//! 4. Anything else: unknown
//!
//! If the classified decoder fails, or nothing matched, the Static, Dynamic
//! and SSB decoders are tried in that order and the first success wins.
//! When all of them fail, a `#UT` input reports the Static Frame error; any
//! other input reports `UnsupportedFormat` listing every decoder's error.

use crate::decoded::{DecodedBarcode, Frame};
use crate::error::{UicError, UicResult};
use crate::options::DecodeOptions;
use uic_core::FrameType;
use uic_frame::static_frame::frame::HEADER_TOKEN;
use uic_frame::{DynamicFrame, SsbFrame, StaticFrame};

/// Frames of at most this many bytes are never classified as dynamic
pub const MIN_DYNAMIC_FRAME_LEN: usize = 10;

/// Classify raw barcode bytes without decoding them
pub fn detect(data: &[u8]) -> FrameType {
    if data.starts_with(HEADER_TOKEN) {
        let version = data
            .get(3..5)
            .and_then(|digits| std::str::from_utf8(digits).ok())
            .and_then(|digits| digits.parse::<u8>().ok())
            .unwrap_or(1);
        return FrameType::StaticFrame { version };
    }
    if SsbFrame::looks_like_ssb(data) {
        return FrameType::SsbFrame;
    }
    if data.len() > MIN_DYNAMIC_FRAME_LEN {
        return FrameType::DynamicFrame { version: None };
    }
    FrameType::Unknown
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Static,
    Dynamic,
    Ssb,
}

const FALLBACK_ORDER: [Candidate; 3] = [Candidate::Static, Candidate::Dynamic, Candidate::Ssb];

impl Candidate {
    fn for_type(frame_type: FrameType) -> Option<Self> {
        match frame_type {
            FrameType::StaticFrame { .. } => Some(Candidate::Static),
            FrameType::DynamicFrame { .. } => Some(Candidate::Dynamic),
            FrameType::SsbFrame => Some(Candidate::Ssb),
            FrameType::Unknown => None,
        }
    }

    fn decode(&self, data: &[u8], options: &DecodeOptions) -> UicResult<Frame> {
        match self {
            Candidate::Static => StaticFrame::decode(
                data,
                options.ticket_codec.as_ref(),
                options.max_decompressed_size,
            )
            .map(Frame::Static),
            Candidate::Dynamic => DynamicFrame::decode(data).map(Frame::Dynamic),
            Candidate::Ssb => SsbFrame::decode(data).map(Frame::Ssb),
        }
    }
}

/// Decode a barcode with the given options
///
/// # Error Handling
/// - The Static Frame error if the data starts with `#UT` and no decoder
///   accepts it
/// - Otherwise `UnsupportedFormat` if no decoder accepts the data; the
///   message lists each decoder's error
pub fn decode_with(data: &[u8], options: &DecodeOptions) -> UicResult<DecodedBarcode> {
    let detected = Candidate::for_type(detect(data));
    let mut failures = Vec::new();
    let mut static_error = None;

    if let Some(candidate) = detected {
        match candidate.decode(data, options) {
            Ok(frame) => return DecodedBarcode::from_frame(frame, options),
            Err(e) => {
                log::debug!("{:?} frame decode failed: {}", candidate, e);
                failures.push(format!("{:?}: {}", candidate, e));
                if candidate == Candidate::Static {
                    static_error = Some(e);
                }
            }
        }
    }

    for candidate in FALLBACK_ORDER.iter().filter(|c| Some(**c) != detected) {
        match candidate.decode(data, options) {
            Ok(frame) => {
                log::debug!("Decoded as {:?} frame by fallback", candidate);
                return DecodedBarcode::from_frame(frame, options);
            }
            Err(e) => {
                log::trace!("{:?} fallback failed: {}", candidate, e);
                failures.push(format!("{:?}: {}", candidate, e));
            }
        }
    }

    if let Some(e) = static_error {
        log::debug!("No frame decoder accepted #UT data ({})", failures.join("; "));
        return Err(e);
    }
    Err(UicError::UnsupportedFormat(format!(
        "No frame decoder accepted {} bytes ({})",
        data.len(),
        failures.join("; ")
    )))
}

/// Decode a barcode with default options
pub fn decode(data: &[u8]) -> UicResult<DecodedBarcode> {
    decode_with(data, &DecodeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use std::sync::Arc;
    use uic_frame::dynamic_frame::{DataType, DynamicFrameVersion, Level1Data};
    use uic_frame::{FcbTicket, FlexRecord, OpaqueTicketCodec, TicketCodec, TicketHeader};

    mock! {
        Codec {}
        impl TicketCodec for Codec {
            fn decode(&self, data: &[u8], version: u8) -> UicResult<FcbTicket>;
            fn encode(&self, ticket: &FcbTicket) -> UicResult<Vec<u8>>;
        }
    }

    fn ssb_bytes() -> Vec<u8> {
        SsbFrame {
            version: 2,
            issuer: 1181,
            ticket_type: 1,
            key_id: 3,
            ticket_data: vec![0x55; 10],
            signature: Vec::new(),
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect(b"#UT02rest"), FrameType::StaticFrame { version: 2 });
        assert_eq!(detect(b"#UTxx"), FrameType::StaticFrame { version: 1 });
        assert_eq!(detect(b"#UT"), FrameType::StaticFrame { version: 1 });
        assert_eq!(detect(&ssb_bytes()), FrameType::SsbFrame);
        assert_eq!(detect(&[0u8; 114]), FrameType::DynamicFrame { version: None });
        assert_eq!(detect(&[0u8; 11]), FrameType::DynamicFrame { version: None });
        assert_eq!(detect(&[0u8; 10]), FrameType::Unknown);
    }

    #[test]
    fn test_decode_each_format() {
        let ssb = decode(&ssb_bytes()).unwrap();
        assert_eq!(ssb.frame_type, FrameType::SsbFrame);
        assert_eq!(ssb.signature.security_provider_num, Some(1181));
        assert_eq!(ssb.signature.signed_data.as_deref(), Some(&ssb_bytes()[..58]));

        let dynamic = DynamicFrame::new(
            DynamicFrameVersion::V1,
            Level1Data {
                security_provider_ia5: Some("1184".to_string()),
                data_sequence: vec![DataType::new("FCB1", vec![0xAB; 4])],
                ..Default::default()
            },
        );
        let decoded = decode(&dynamic.encode().unwrap()).unwrap();
        assert_eq!(decoded.frame_type, FrameType::DynamicFrame { version: Some(1) });
        assert_eq!(decoded.fcb_version, Some(1));
        assert_eq!(decoded.security_provider().unwrap(), "1184");

        let mut frame = StaticFrame::new(2, "1080", "1");
        frame.flex = Some(FlexRecord {
            ticket: FcbTicket {
                version: 2,
                data: vec![1, 2, 3],
                header: None,
            },
        });
        let decoded = decode(&frame.encode(&OpaqueTicketCodec).unwrap()).unwrap();
        assert_eq!(decoded.frame_type, FrameType::StaticFrame { version: 2 });
        assert_eq!(decoded.fcb_version, Some(2));
        assert_eq!(decoded.signature.key_id.as_deref(), Some("00001"));
    }

    #[test]
    fn test_static_ticket_through_codec() {
        let mut frame = StaticFrame::new(1, "1080", "00002");
        frame.flex = Some(FlexRecord {
            ticket: FcbTicket {
                version: 3,
                data: vec![9, 9],
                header: None,
            },
        });
        let bytes = frame.encode(&OpaqueTicketCodec).unwrap();

        let mut codec = MockCodec::new();
        codec
            .expect_decode()
            .withf(|data, version| data.to_vec() == [9u8, 9] && *version == 3)
            .times(1)
            .returning(|data, version| {
                Ok(FcbTicket {
                    version,
                    data: data.to_vec(),
                    header: Some(TicketHeader {
                        security_provider_num: Some(3018),
                        ..TicketHeader::default()
                    }),
                })
            });
        let options = DecodeOptions::default().with_ticket_codec(Arc::new(codec));
        let decoded = decode_with(&bytes, &options).unwrap();
        assert_eq!(decoded.signature.security_provider_ia5.as_deref(), Some("3018"));
    }

    #[test]
    fn test_fallback_after_misclassification() {
        // an SSB frame whose version nibble is out of range looks dynamic
        let mut bytes = ssb_bytes();
        bytes[0] &= 0x0F;
        assert_eq!(detect(&bytes), FrameType::DynamicFrame { version: None });
        assert!(decode(&bytes).is_err());

        let mut bytes = ssb_bytes();
        bytes[0] = (bytes[0] & 0x0F) | 0x30;
        assert_eq!(decode(&bytes).unwrap().frame_type, FrameType::SsbFrame);
    }

    #[test]
    fn test_unsupported_format() {
        let error = decode(b"hello").unwrap_err();
        assert!(matches!(error, UicError::UnsupportedFormat(_)));
        let message = error.to_string();
        assert!(message.contains("Static"));
        assert!(message.contains("Ssb"));

        assert!(matches!(
            decode(&[b'X'; 68]),
            Err(UicError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_static_header_keeps_static_error() {
        let mut bytes = b"#UT01".to_vec();
        bytes.resize(68, b'X');
        assert_eq!(detect(&bytes), FrameType::StaticFrame { version: 1 });
        assert!(matches!(decode(&bytes), Err(UicError::InvalidDer(_))));

        let mut truncated = b"#UT02".to_vec();
        truncated.resize(40, b'0');
        assert!(matches!(
            decode(&truncated),
            Err(UicError::FrameSizeMismatch { expected: 82, actual: 40 })
        ));
    }
}
