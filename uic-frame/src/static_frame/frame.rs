//! Static Frame (`#UT`) decoder and encoder
//!
//! # Wire Layout
//!
//! ```text
//! offset  size   field
//! 0       3      "#UT"
//! 3       2      version "01" | "02"
//! 5       4      security provider, space padded
//! 9       5      key id, zero padded
//! 14      50|64  signature slot
//! 64|78   4      compressed payload length
//! 68|82   N      zlib payload
//! ```

use crate::compression::{compress, decompress};
use crate::error::{UicError, UicResult};
use crate::static_frame::flex::FlexRecord;
use crate::static_frame::header::HeaderRecord;
use crate::static_frame::layout::LayoutRecord;
use crate::static_frame::record::{
    DataRecord, TAG_FLEX, TAG_HEAD, TAG_LAYOUT, ascii_field, decimal_field, push_decimal,
    push_fixed, split_records,
};
use crate::static_frame::signature::{decode_slot, encode_slot, slot_len};
use crate::ticket::TicketCodec;
use uic_security::{PrivateKey, SigningAlgorithm};

/// Literal token opening every Static Frame
pub const HEADER_TOKEN: &[u8; 3] = b"#UT";

/// Bytes before the compressed payload of a v1 frame
pub const V1_HEADER_LEN: usize = 68;

/// Bytes before the compressed payload of a v2 frame
pub const V2_HEADER_LEN: usize = 82;

const SIGNATURE_OFFSET: usize = 14;
const KEY_ID_LEN: usize = 5;

/// Bytes before the compressed payload for a frame version
pub fn header_len(version: u8) -> UicResult<usize> {
    Ok(SIGNATURE_OFFSET + slot_len(version)? + 4)
}

/// A decoded Static Frame
///
/// The signature is held as DER whatever the slot layout of `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFrame {
    /// Frame version, 1 or 2
    pub version: u8,
    /// 4-character security provider code
    pub security_provider: String,
    /// Key id, up to 5 digits
    pub signature_key_id: String,
    /// DER signature, empty when unsigned
    pub signature: Vec<u8>,
    pub header: Option<HeaderRecord>,
    pub flex: Option<FlexRecord>,
    pub layouts: Vec<LayoutRecord>,
    /// Records without a dedicated parser
    pub data_records: Vec<DataRecord>,
    signed_data: Option<Vec<u8>>,
}

impl StaticFrame {
    /// Create an empty, unsigned frame
    pub fn new(version: u8, security_provider: impl Into<String>, signature_key_id: impl Into<String>) -> Self {
        Self {
            version,
            security_provider: security_provider.into(),
            signature_key_id: signature_key_id.into(),
            signature: Vec::new(),
            header: None,
            flex: None,
            layouts: Vec::new(),
            data_records: Vec::new(),
            signed_data: None,
        }
    }

    /// Decode a Static Frame
    ///
    /// # Arguments
    /// * `data` - Raw barcode bytes
    /// * `codec` - Codec for the FCB ticket in a `U_FLEX` record
    /// * `max_decompressed_size` - Upper bound for the inflated payload
    ///
    /// # Error Handling
    /// - `InvalidHeader` if the frame does not start with `#UT`
    /// - `UnsupportedVersion` for versions other than 1 and 2
    /// - `FrameSizeMismatch` if the frame is shorter than its header or
    ///   declared payload length
    pub fn decode(data: &[u8], codec: &dyn TicketCodec, max_decompressed_size: usize) -> UicResult<Self> {
        if data.len() < HEADER_TOKEN.len() || &data[..HEADER_TOKEN.len()] != HEADER_TOKEN {
            return Err(UicError::InvalidHeader(format!(
                "Static frame must start with #UT, found {:02X?}",
                &data[..data.len().min(3)]
            )));
        }
        let version_text = ascii_field(data, 3, 2, "frame version")
            .map_err(|e| UicError::InvalidHeader(e.to_string()))?;
        let version = match version_text.as_str() {
            "01" => 1,
            "02" => 2,
            other => {
                return Err(UicError::UnsupportedVersion(format!(
                    "Static frame version '{}'",
                    other
                )));
            }
        };

        let header_len = header_len(version)?;
        if data.len() < header_len {
            return Err(UicError::FrameSizeMismatch {
                expected: header_len,
                actual: data.len(),
            });
        }
        let security_provider = ascii_field(data, 5, 4, "security provider")?;
        let signature_key_id = ascii_field(data, 9, KEY_ID_LEN, "key id")?;
        let slot_end = header_len - 4;
        let signature = decode_slot(version, &data[SIGNATURE_OFFSET..slot_end])?;

        let payload_len = decimal_field(data, slot_end, 4, "payload length")?;
        let payload_end = header_len + payload_len;
        if data.len() < payload_end {
            return Err(UicError::FrameSizeMismatch {
                expected: payload_end,
                actual: data.len(),
            });
        }
        if data.len() > payload_end {
            log::debug!("Ignoring {} bytes after the static frame payload", data.len() - payload_end);
        }
        let compressed = &data[header_len..payload_end];
        let payload = decompress(compressed, max_decompressed_size)?;

        let mut frame = Self::new(version, security_provider, signature_key_id);
        frame.signature = signature;
        frame.signed_data = Some(compressed.to_vec());

        for record in split_records(&payload)? {
            match record.tag.as_str() {
                TAG_HEAD => frame.header = Some(HeaderRecord::decode(&record)?),
                TAG_LAYOUT => frame.layouts.push(LayoutRecord::decode(&record)?),
                TAG_FLEX if frame.flex.is_none() => {
                    frame.flex = Some(FlexRecord::decode(&record, codec)?);
                }
                _ => {
                    log::trace!("Keeping record {} v{} as generic data", record.tag, record.version);
                    frame.data_records.push(record);
                }
            }
        }
        Ok(frame)
    }

    /// Serialize the records into the uncompressed payload
    ///
    /// Order: `U_HEAD`, `U_FLEX`, `U_TLAY` records, then generic records.
    pub fn encode_payload(&self, codec: &dyn TicketCodec) -> UicResult<Vec<u8>> {
        let mut payload = Vec::new();
        if let Some(header) = &self.header {
            payload.extend(header.to_record()?.encode()?);
        }
        if let Some(flex) = &self.flex {
            payload.extend(flex.to_record(codec)?.encode()?);
        }
        for layout in &self.layouts {
            payload.extend(layout.to_record()?.encode()?);
        }
        for record in &self.data_records {
            payload.extend(record.encode()?);
        }
        Ok(payload)
    }

    /// Compressed payload as it is signed and written
    pub fn signed_bytes(&self, codec: &dyn TicketCodec) -> UicResult<Vec<u8>> {
        compress(&self.encode_payload(codec)?)
    }

    /// Encode the frame to barcode bytes
    pub fn encode(&self, codec: &dyn TicketCodec) -> UicResult<Vec<u8>> {
        let header_len = header_len(self.version)?;
        let compressed = self.signed_bytes(codec)?;

        let mut out = Vec::with_capacity(header_len + compressed.len());
        out.extend_from_slice(HEADER_TOKEN);
        push_decimal(&mut out, usize::from(self.version), 2, "frame version")?;
        push_fixed(&mut out, &self.security_provider, 4, "security provider")?;
        push_key_id(&mut out, &self.signature_key_id)?;
        out.extend(encode_slot(self.version, &self.signature)?);
        push_decimal(&mut out, compressed.len(), 4, "payload length")?;
        out.extend(compressed);
        Ok(out)
    }

    /// Sign the compressed payload and store the DER signature
    pub fn sign(
        &mut self,
        private_key: &PrivateKey,
        algorithm: SigningAlgorithm,
        codec: &dyn TicketCodec,
    ) -> UicResult<()> {
        let signed = self.signed_bytes(codec)?;
        self.signature = uic_security::sign(&signed, private_key, algorithm)?;
        self.signed_data = Some(signed);
        Ok(())
    }

    /// Bytes the signature covers, as read from the wire or produced by `sign`
    pub fn signed_data(&self) -> Option<&[u8]> {
        self.signed_data.as_deref()
    }

    /// Security provider after applying the record-level overrides
    ///
    /// Starting from the frame's own provider, each of these replaces the
    /// current value when non-empty, in order: `U_HEAD` issuer, ticket
    /// issuer, ticket security provider.
    pub fn resolved_security_provider(&self) -> String {
        let mut provider = self.security_provider.clone();
        if let Some(header) = &self.header
            && !header.issuer.is_empty()
        {
            provider = header.issuer.clone();
        }
        let ticket_header = self.flex.as_ref().and_then(|flex| flex.ticket.header.as_ref());
        if let Some(ticket_header) = ticket_header {
            for candidate in [ticket_header.issuer(), ticket_header.security_provider()]
                .into_iter()
                .flatten()
            {
                if !candidate.is_empty() {
                    provider = candidate;
                }
            }
        }
        provider
    }
}

fn push_key_id(out: &mut Vec<u8>, key_id: &str) -> UicResult<()> {
    if !key_id.is_empty() && key_id.bytes().all(|b| b.is_ascii_digit()) {
        if key_id.len() > KEY_ID_LEN {
            return Err(UicError::InvalidData(format!(
                "key id '{}' longer than {} digits",
                key_id, KEY_ID_LEN
            )));
        }
        out.resize(out.len() + KEY_ID_LEN - key_id.len(), b'0');
        out.extend_from_slice(key_id.as_bytes());
        return Ok(());
    }
    push_fixed(out, key_id, KEY_ID_LEN, "key id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::DEFAULT_MAX_DECOMPRESSED_SIZE;
    use crate::static_frame::layout::LayoutField;
    use crate::ticket::{FcbTicket, MockTicketCodec, OpaqueTicketCodec, TicketHeader};
    use chrono::NaiveDate;
    use uic_security::{EcCurve, HashAlgorithm, PublicKey};

    fn sample_frame(version: u8) -> StaticFrame {
        let mut frame = StaticFrame::new(version, "1080", "00007");
        frame.header = Some(HeaderRecord {
            issuer: "1080".to_string(),
            identifier: "TICKET0001".to_string(),
            issuing_date: NaiveDate::from_ymd_opt(2020, 3, 1)
                .unwrap()
                .and_hms_opt(12, 5, 0)
                .unwrap(),
            flags: 1,
            language: "DE".to_string(),
            additional_language: String::new(),
        });
        frame.flex = Some(FlexRecord {
            ticket: FcbTicket {
                version: 3,
                data: vec![0x12, 0x34, 0x56],
                header: None,
            },
        });
        frame.layouts.push(LayoutRecord {
            standard: "RCT2".to_string(),
            fields: vec![LayoutField {
                line: 1,
                column: 2,
                height: 1,
                width: 30,
                formatting: 0,
                text: "Köln Hbf".to_string(),
            }],
        });
        frame.data_records.push(DataRecord::new("0080VU", "01", b"vendor".to_vec()));
        frame
    }

    fn decode(bytes: &[u8]) -> UicResult<StaticFrame> {
        StaticFrame::decode(bytes, &OpaqueTicketCodec, DEFAULT_MAX_DECOMPRESSED_SIZE)
    }

    #[test]
    fn test_rejects_missing_header_token() {
        let bytes = vec![b'X'; V1_HEADER_LEN];
        assert!(matches!(decode(&bytes), Err(UicError::InvalidHeader(_))));
        assert!(matches!(decode(b"#U"), Err(UicError::InvalidHeader(_))));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut bytes = b"#UT03".to_vec();
        bytes.resize(V2_HEADER_LEN, b'0');
        assert!(matches!(decode(&bytes), Err(UicError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_v1_roundtrip() {
        let frame = sample_frame(1);
        let bytes = frame.encode(&OpaqueTicketCodec).unwrap();
        assert_eq!(&bytes[..14], b"#UT01108000007");

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.version, 1);
        assert_eq!(decoded.security_provider, "1080");
        assert_eq!(decoded.signature_key_id, "00007");
        assert!(decoded.signature.is_empty());
        assert_eq!(decoded.header, frame.header);
        assert_eq!(decoded.flex, frame.flex);
        assert_eq!(decoded.layouts, frame.layouts);
        assert_eq!(decoded.data_records, frame.data_records);
        assert_eq!(decoded.signed_data().unwrap(), &bytes[V1_HEADER_LEN..]);
    }

    #[test]
    fn test_v2_raw_signature_slot() {
        let mut frame = sample_frame(2);
        let mut raw = vec![0x81u8; 32];
        raw.extend_from_slice(&[0x42; 32]);
        frame.signature = uic_security::raw_to_der(&raw[..32], &raw[32..]).unwrap();

        let bytes = frame.encode(&OpaqueTicketCodec).unwrap();
        assert_eq!(&bytes[14..78], raw.as_slice());
        assert_eq!(&bytes[78..82], format!("{:04}", bytes.len() - 82).as_bytes());

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.signature, frame.signature);
        assert_eq!(&decoded.signature[2..5], &[0x02, 0x21, 0x00]);
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = sample_frame(1).encode(&OpaqueTicketCodec).unwrap();
        let short = &bytes[..bytes.len() - 1];
        assert!(matches!(
            decode(short),
            Err(UicError::FrameSizeMismatch { expected, actual }) if expected == bytes.len() && actual == short.len()
        ));
        assert!(matches!(
            decode(&bytes[..40]),
            Err(UicError::FrameSizeMismatch { expected: 68, actual: 40 })
        ));
    }

    #[test]
    fn test_security_provider_cascade() {
        let mut frame = sample_frame(1);
        frame.security_provider = "1080".to_string();
        if let Some(header) = frame.header.as_mut() {
            header.issuer = "AAAA".to_string();
        }
        let bytes = frame.encode(&OpaqueTicketCodec).unwrap();

        let mut codec = MockTicketCodec::new();
        codec.expect_decode().times(1).returning(|data, version| {
            Ok(FcbTicket {
                version,
                data: data.to_vec(),
                header: Some(TicketHeader {
                    issuer_ia5: Some("BBBB".to_string()),
                    ..TicketHeader::default()
                }),
            })
        });
        let decoded = StaticFrame::decode(&bytes, &codec, DEFAULT_MAX_DECOMPRESSED_SIZE).unwrap();
        assert_eq!(decoded.resolved_security_provider(), "BBBB");

        let mut without_ticket = decoded.clone();
        without_ticket.flex = None;
        assert_eq!(without_ticket.resolved_security_provider(), "AAAA");
        without_ticket.header = None;
        assert_eq!(without_ticket.resolved_security_provider(), "1080");
    }

    #[test]
    fn test_ticket_security_provider_wins() {
        let mut frame = sample_frame(1);
        if let Some(flex) = frame.flex.as_mut() {
            flex.ticket.header = Some(TicketHeader {
                security_provider_num: Some(1184),
                issuer_ia5: Some("BBBB".to_string()),
                ..TicketHeader::default()
            });
        }
        assert_eq!(frame.resolved_security_provider(), "1184");
    }

    #[test]
    fn test_sign_and_verify() {
        let scalar = vec![0x33u8; 32];
        let point = p256::ecdsa::SigningKey::from_slice(&scalar)
            .unwrap()
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        let private_key = PrivateKey::Ec {
            curve: EcCurve::P256,
            scalar,
        };
        let algorithm = SigningAlgorithm::Ecdsa(HashAlgorithm::Sha256);

        let mut frame = sample_frame(2);
        frame.sign(&private_key, algorithm, &OpaqueTicketCodec).unwrap();
        let bytes = frame.encode(&OpaqueTicketCodec).unwrap();

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.signed_data(), frame.signed_data());
        let public_key = PublicKey::from_bytes(&point).unwrap();
        assert!(
            uic_security::verify(
                &decoded.signature,
                decoded.signed_data().unwrap(),
                &public_key,
                algorithm
            )
            .unwrap()
        );
    }

    #[test]
    fn test_key_id_padding() {
        let mut out = Vec::new();
        push_key_id(&mut out, "42").unwrap();
        push_key_id(&mut out, "AB").unwrap();
        assert_eq!(out, b"00042AB   ");
        assert!(push_key_id(&mut out, "123456").is_err());
    }
}
