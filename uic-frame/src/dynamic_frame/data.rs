//! Tagged data item (`DataType`)

use crate::error::UicResult;
use serde::{Deserialize, Serialize};
use uic_asn1::uper::{UperDecode, UperDecoder, UperEncode, UperEncoder};

/// A format tag and the bytes it describes
///
/// ```text
/// DataType ::= SEQUENCE {
///     dataFormat IA5String,
///     data       OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    /// Format tag, e.g. `FCB3` or `FDC1`
    pub format: String,
    pub data: Vec<u8>,
}

impl DataType {
    pub fn new(format: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            format: format.into(),
            data,
        }
    }
}

impl UperDecode for DataType {
    fn decode_uper(decoder: &mut UperDecoder) -> UicResult<Self> {
        let format = decoder.decode_ia5_string()?;
        let data = decoder.decode_octet_string()?;
        Ok(Self { format, data })
    }
}

impl UperEncode for DataType {
    fn encode_uper(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_ia5_string(&self.format)?;
        encoder.encode_octet_string(&self.data)
    }
}
