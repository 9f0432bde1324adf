//! Level 2 signed data: level 1, its signature and the dynamic content
//!
//! ```text
//! Level2DataType ::= SEQUENCE {
//!     level1Data      Level1DataType,
//!     level1Signature OCTET STRING OPTIONAL,
//!     level2Data      DataType     OPTIONAL
//! }
//! ```

use crate::dynamic_frame::content::{DYNAMIC_CONTENT_FORMAT, UicDynamicContent};
use crate::dynamic_frame::data::DataType;
use crate::dynamic_frame::frame::DynamicFrameVersion;
use crate::dynamic_frame::level1::Level1Data;
use crate::error::UicResult;
use std::ops::Range;
use uic_asn1::uper::{UperDecode, UperDecoder, UperEncode, UperEncoder, from_uper_bytes, to_uper_bytes};

/// Content of the `level2Data` item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level2Content {
    /// `FDC1` item, parsed
    Dynamic(UicDynamicContent),
    /// Any other tag, kept as is
    Other(DataType),
}

impl Level2Content {
    /// Format tag of the item
    pub fn format(&self) -> &str {
        match self {
            Level2Content::Dynamic(_) => DYNAMIC_CONTENT_FORMAT,
            Level2Content::Other(item) => &item.format,
        }
    }

    /// Interpret a `level2Data` item
    pub fn from_data_type(item: DataType) -> UicResult<Self> {
        if item.format == DYNAMIC_CONTENT_FORMAT {
            return Ok(Level2Content::Dynamic(from_uper_bytes(&item.data)?));
        }
        Ok(Level2Content::Other(item))
    }

    /// Wire form of the item
    pub fn to_data_type(&self) -> UicResult<DataType> {
        match self {
            Level2Content::Dynamic(content) => Ok(DataType::new(DYNAMIC_CONTENT_FORMAT, to_uper_bytes(content)?)),
            Level2Content::Other(item) => Ok(item.clone()),
        }
    }
}

/// Structure covered by the level-2 signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level2Data {
    pub level1_data: Level1Data,
    pub level1_signature: Option<Vec<u8>>,
    pub level2_data: Option<Level2Content>,
}

impl Level2Data {
    /// Wrap level 1 without signature or dynamic content
    pub fn new(level1_data: Level1Data) -> Self {
        Self {
            level1_data,
            level1_signature: None,
            level2_data: None,
        }
    }

    /// Decode in the schema of `version`
    pub fn decode(decoder: &mut UperDecoder, version: DynamicFrameVersion) -> UicResult<Self> {
        Self::decode_spanned(decoder, version).map(|(data, _)| data)
    }

    /// Decode and report the bit range level 1 occupied
    pub(crate) fn decode_spanned(
        decoder: &mut UperDecoder,
        version: DynamicFrameVersion,
    ) -> UicResult<(Self, Range<usize>)> {
        let present = decoder.decode_presence_bitmap(2)?;
        let start = decoder.position();
        let level1_data = Level1Data::decode(decoder, version)?;
        let level1_span = start..decoder.position();

        let level1_signature = present[0].then(|| decoder.decode_octet_string()).transpose()?;
        let level2_data = present[1]
            .then(|| DataType::decode_uper(decoder).and_then(Level2Content::from_data_type))
            .transpose()?;
        Ok((
            Self {
                level1_data,
                level1_signature,
                level2_data,
            },
            level1_span,
        ))
    }

    /// Encode in the schema of `version`
    pub fn encode(&self, encoder: &mut UperEncoder, version: DynamicFrameVersion) -> UicResult<()> {
        encoder.encode_presence_bitmap(&[self.level1_signature.is_some(), self.level2_data.is_some()]);
        self.level1_data.encode(encoder, version)?;
        if let Some(signature) = &self.level1_signature {
            encoder.encode_octet_string(signature)?;
        }
        if let Some(content) = &self.level2_data {
            content.to_data_type()?.encode_uper(encoder)?;
        }
        Ok(())
    }

    /// Parsed `FDC1` content, if that is what level 2 carries
    pub fn dynamic_content(&self) -> Option<&UicDynamicContent> {
        match &self.level2_data {
            Some(Level2Content::Dynamic(content)) => Some(content),
            _ => None,
        }
    }
}
