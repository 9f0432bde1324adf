//! `U_FLEX` record carrying a UPER-encoded FCB ticket

use crate::error::{UicError, UicResult};
use crate::static_frame::record::{DataRecord, TAG_FLEX};
use crate::ticket::{FcbTicket, TicketCodec};

/// FCB ticket record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexRecord {
    pub ticket: FcbTicket,
}

impl FlexRecord {
    /// FCB version for a `U_FLEX` record version
    ///
    /// FCB 1 was published as record version `13`; later versions use their
    /// own number.
    pub fn fcb_version(record_version: &str) -> UicResult<u8> {
        match record_version {
            "13" | "01" => Ok(1),
            "02" => Ok(2),
            "03" => Ok(3),
            other => Err(UicError::UnsupportedVersion(format!(
                "U_FLEX record version {}",
                other
            ))),
        }
    }

    /// `U_FLEX` record version for an FCB version
    pub fn record_version(fcb_version: u8) -> UicResult<&'static str> {
        match fcb_version {
            1 => Ok("13"),
            2 => Ok("02"),
            3 => Ok("03"),
            other => Err(UicError::UnsupportedVersion(format!("FCB version {}", other))),
        }
    }

    /// Decode the ticket inside a `U_FLEX` record
    pub fn decode(record: &DataRecord, codec: &dyn TicketCodec) -> UicResult<Self> {
        let version = Self::fcb_version(&record.version)?;
        let ticket = codec.decode(&record.content, version)?;
        Ok(Self { ticket })
    }

    /// Build the `U_FLEX` record
    pub fn to_record(&self, codec: &dyn TicketCodec) -> UicResult<DataRecord> {
        let version = Self::record_version(self.ticket.version)?;
        Ok(DataRecord::new(TAG_FLEX, version, codec.encode(&self.ticket)?))
    }
}
