//! Day-of-year timestamp of the dynamic content

use crate::error::{UicError, UicResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uic_asn1::uper::{UperDecode, UperDecoder, UperEncode, UperEncoder};

/// Days a stamp may lie ahead of or behind the reference date before it is
/// attributed to the neighbouring year
pub const YEAR_WINDOW_DAYS: i64 = 250;

/// UTC day of year and second of day, without the year
///
/// ```text
/// TimeStamp ::= SEQUENCE {
///     day  INTEGER (1..366),
///     time INTEGER (0..86399)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStamp {
    pub day: u16,
    pub time: u32,
}

impl TimeStamp {
    /// Stamp for the current UTC time
    pub fn now() -> Self {
        Self::from_date_time(Utc::now().naive_utc())
    }

    /// Stamp for a UTC date and time
    pub fn from_date_time(date_time: NaiveDateTime) -> Self {
        Self {
            day: date_time.ordinal() as u16,
            time: date_time.num_seconds_from_midnight(),
        }
    }

    /// Resolve the stamp to a full date and time
    ///
    /// The year is taken from `reference`, minus one if the stamped day is
    /// more than 250 days after the reference day, plus one if it is more
    /// than 250 days before.
    ///
    /// # Error Handling
    /// Returns `InvalidData` if the day does not exist in the inferred year
    /// (day 366 of a common year) or the time is out of range.
    pub fn to_date_time(&self, reference: NaiveDate) -> UicResult<NaiveDateTime> {
        let offset = i64::from(self.day) - i64::from(reference.ordinal());
        let year = if offset > YEAR_WINDOW_DAYS {
            reference.year() - 1
        } else if offset < -YEAR_WINDOW_DAYS {
            reference.year() + 1
        } else {
            reference.year()
        };
        let date = NaiveDate::from_yo_opt(year, u32::from(self.day)).ok_or_else(|| {
            UicError::InvalidData(format!("Day {} does not exist in {}", self.day, year))
        })?;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(self.time, 0)
            .ok_or_else(|| UicError::InvalidData(format!("Invalid second of day {}", self.time)))?;
        Ok(date.and_time(time))
    }
}

impl UperDecode for TimeStamp {
    fn decode_uper(decoder: &mut UperDecoder) -> UicResult<Self> {
        let day = decoder.decode_constrained_integer(1, 366)? as u16;
        let time = decoder.decode_constrained_integer(0, 86399)? as u32;
        Ok(Self { day, time })
    }
}

impl UperEncode for TimeStamp {
    fn encode_uper(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_constrained_integer(i64::from(self.day), 1, 366)?;
        encoder.encode_constrained_integer(i64::from(self.time), 0, 86399)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uic_asn1::uper::{from_uper_bytes, to_uper_bytes};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_from_date_time() {
        let stamp = TimeStamp::from_date_time(date(2021, 2, 1).and_hms_opt(1, 2, 3).unwrap());
        assert_eq!(stamp, TimeStamp { day: 32, time: 3723 });
    }

    #[test]
    fn test_same_year() {
        let stamp = TimeStamp { day: 32, time: 3723 };
        assert_eq!(
            stamp.to_date_time(date(2021, 3, 1)).unwrap(),
            date(2021, 2, 1).and_hms_opt(1, 2, 3).unwrap()
        );
    }

    #[test]
    fn test_year_boundaries() {
        // stamped on 31 December, read on 2 January
        let late = TimeStamp { day: 365, time: 0 };
        assert_eq!(late.to_date_time(date(2022, 1, 2)).unwrap().date(), date(2021, 12, 31));

        // stamped on 1 January, read on 30 December
        let early = TimeStamp { day: 1, time: 0 };
        assert_eq!(early.to_date_time(date(2021, 12, 30)).unwrap().date(), date(2022, 1, 1));
    }

    #[test]
    fn test_window_threshold() {
        // reference day 1: day 251 is exactly 250 ahead and stays in the year
        let reference = date(2021, 1, 1);
        let edge = TimeStamp { day: 251, time: 0 };
        assert_eq!(edge.to_date_time(reference).unwrap().year(), 2021);
        let beyond = TimeStamp { day: 252, time: 0 };
        assert_eq!(beyond.to_date_time(reference).unwrap().year(), 2020);
    }

    #[test]
    fn test_day_366_in_common_year() {
        let stamp = TimeStamp { day: 366, time: 0 };
        assert!(stamp.to_date_time(date(2021, 12, 1)).is_err());
        assert!(stamp.to_date_time(date(2020, 12, 1)).is_ok());
    }

    #[test]
    fn test_uper_width() {
        let stamp = TimeStamp { day: 366, time: 86399 };
        let bytes = to_uper_bytes(&stamp).unwrap();
        // 9 + 17 bits
        assert_eq!(bytes.len(), 4);
        assert_eq!(from_uper_bytes::<TimeStamp>(&bytes).unwrap(), stamp);
    }
}
