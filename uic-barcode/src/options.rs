//! Decode configuration

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uic_frame::compression::DEFAULT_MAX_DECOMPRESSED_SIZE;
use uic_frame::{OpaqueTicketCodec, TicketCodec};

/// Shared FCB ticket codec
pub type SharedTicketCodec = Arc<dyn TicketCodec + Send + Sync>;

/// Barcode decode options
///
/// # Usage Example
/// ```rust,no_run
/// use uic_barcode::DecodeOptions;
/// # fn main() -> uic_barcode::UicResult<()> {
/// # let data: Vec<u8> = Vec::new();
///
/// let options = DecodeOptions::default()
///     .with_max_decompressed_size(64 * 1024)
///     .with_reference_date(chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
/// let barcode = uic_barcode::decode_with(&data, &options)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Upper bound for an inflated Static Frame payload
    pub max_decompressed_size: usize,
    /// Date that resolves the year of dynamic content timestamps; today
    /// (UTC) when unset
    pub reference_date: Option<NaiveDate>,
    /// Codec for FCB ticket payloads
    #[serde(skip, default = "default_ticket_codec")]
    pub ticket_codec: SharedTicketCodec,
}

fn default_ticket_codec() -> SharedTicketCodec {
    Arc::new(OpaqueTicketCodec)
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_decompressed_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
            reference_date: None,
            ticket_codec: default_ticket_codec(),
        }
    }
}

impl DecodeOptions {
    /// Set the decompression limit
    pub fn with_max_decompressed_size(mut self, max_decompressed_size: usize) -> Self {
        self.max_decompressed_size = max_decompressed_size;
        self
    }

    /// Set the reference date for timestamp year inference
    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = Some(reference_date);
        self
    }

    /// Set the FCB ticket codec
    pub fn with_ticket_codec(mut self, ticket_codec: SharedTicketCodec) -> Self {
        self.ticket_codec = ticket_codec;
        self
    }

    /// Reference date, defaulting to today in UTC
    pub fn effective_reference_date(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("max_decompressed_size", &self.max_decompressed_size)
            .field("reference_date", &self.reference_date)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DecodeOptions::default();
        assert_eq!(options.max_decompressed_size, 1024 * 1024);
        assert!(options.reference_date.is_none());
    }

    #[test]
    fn test_builder() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let options = DecodeOptions::default()
            .with_max_decompressed_size(4096)
            .with_reference_date(date);
        assert_eq!(options.max_decompressed_size, 4096);
        assert_eq!(options.effective_reference_date(), date);
        assert!(format!("{:?}", options).contains("4096"));
    }
}
