//! `U_HEAD` main ticket header record

use crate::error::{UicError, UicResult};
use crate::static_frame::record::{DataRecord, TAG_HEAD, ascii_field, push_fixed};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const ISSUING_DATE_FORMAT: &str = "%d%m%Y%H%M";

/// Bytes up to and including the flags field
const MIN_CONTENT_LEN: usize = 37;

/// Main ticket header
///
/// # Content Layout
///
/// ```text
/// offset  size  field
/// 0       4     issuing company code
/// 4       20    unique ticket key
/// 24      12    edition time DDMMYYYYHHMM
/// 36      1     flags
/// 37      2     edition language
/// 39      2     second language
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub issuer: String,
    pub identifier: String,
    pub issuing_date: NaiveDateTime,
    pub flags: u8,
    pub language: String,
    pub additional_language: String,
}

impl HeaderRecord {
    /// Record version written on encode
    pub const VERSION: &'static str = "01";

    /// Parse the content of a `U_HEAD` record
    pub fn decode(record: &DataRecord) -> UicResult<Self> {
        let content = &record.content;
        if content.len() < MIN_CONTENT_LEN {
            return Err(UicError::InvalidData(format!(
                "U_HEAD content too short: {} bytes (min {})",
                content.len(),
                MIN_CONTENT_LEN
            )));
        }

        let issuer = ascii_field(content, 0, 4, "company code")?;
        let identifier = ascii_field(content, 4, 20, "ticket key")?;
        let date_text = ascii_field(content, 24, 12, "edition time")?;
        let issuing_date = NaiveDateTime::parse_from_str(&date_text, ISSUING_DATE_FORMAT)
            .map_err(|e| UicError::InvalidData(format!("Invalid edition time '{}': {}", date_text, e)))?;
        let flags = match content[36] {
            digit @ b'0'..=b'9' => digit - b'0',
            other => {
                return Err(UicError::InvalidData(format!(
                    "Invalid header flags byte 0x{:02X}",
                    other
                )));
            }
        };
        let language = optional_field(content, 37, 2, "edition language")?;
        let additional_language = optional_field(content, 39, 2, "second language")?;

        Ok(Self {
            issuer,
            identifier,
            issuing_date,
            flags,
            language,
            additional_language,
        })
    }

    /// Build the `U_HEAD` record
    pub fn to_record(&self) -> UicResult<DataRecord> {
        if self.flags > 9 {
            return Err(UicError::InvalidData(format!(
                "Header flags {} do not fit one digit",
                self.flags
            )));
        }
        let mut content = Vec::with_capacity(41);
        push_fixed(&mut content, &self.issuer, 4, "company code")?;
        push_fixed(&mut content, &self.identifier, 20, "ticket key")?;
        push_fixed(
            &mut content,
            &self.issuing_date.format(ISSUING_DATE_FORMAT).to_string(),
            12,
            "edition time",
        )?;
        content.push(b'0' + self.flags);
        push_fixed(&mut content, &self.language, 2, "edition language")?;
        push_fixed(&mut content, &self.additional_language, 2, "second language")?;
        Ok(DataRecord::new(TAG_HEAD, Self::VERSION, content))
    }
}

fn optional_field(content: &[u8], start: usize, len: usize, name: &str) -> UicResult<String> {
    if content.len() < start + len {
        return Ok(String::new());
    }
    ascii_field(content, start, len, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn header() -> HeaderRecord {
        HeaderRecord {
            issuer: "1080".to_string(),
            identifier: "ABC123".to_string(),
            issuing_date: NaiveDate::from_ymd_opt(2019, 12, 20)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
            flags: 0,
            language: "DE".to_string(),
            additional_language: "EN".to_string(),
        }
    }

    #[test]
    fn test_header_layout() {
        let record = header().to_record().unwrap();
        assert_eq!(record.content.len(), 41);
        assert_eq!(&record.content[24..36], b"201220190830");
        assert_eq!(HeaderRecord::decode(&record).unwrap(), header());
    }

    #[test]
    fn test_header_without_languages() {
        let mut record = header().to_record().unwrap();
        record.content.truncate(37);
        let decoded = HeaderRecord::decode(&record).unwrap();
        assert_eq!(decoded.language, "");
        assert_eq!(decoded.issuer, "1080");
    }

    #[test]
    fn test_header_bad_date() {
        let mut record = header().to_record().unwrap();
        record.content[26] = b'9';
        assert!(matches!(
            HeaderRecord::decode(&record),
            Err(UicError::InvalidData(_))
        ));
    }
}
