//! Level 1 data: the ticket payload covered by the level-1 signature
//!
//! ```text
//! Level1DataType ::= SEQUENCE {
//!     securityProviderNum  INTEGER (1..32000)     OPTIONAL,
//!     securityProviderIA5  IA5String              OPTIONAL,
//!     keyId                INTEGER (0..99999)     OPTIONAL,
//!     dataSequence         SEQUENCE OF DataType,
//!     level1KeyAlg         OBJECT IDENTIFIER      OPTIONAL,
//!     level2KeyAlg         OBJECT IDENTIFIER      OPTIONAL,
//!     level1SigningAlg     OBJECT IDENTIFIER      OPTIONAL,
//!     level2SigningAlg     OBJECT IDENTIFIER      OPTIONAL,
//!     level2publicKey      OCTET STRING           OPTIONAL,
//!     -- U2 only
//!     endOfValidityYear    INTEGER (2016..2269)   OPTIONAL,
//!     endOfValidityDay     INTEGER (1..366)       OPTIONAL,
//!     endOfValidityTime    INTEGER (0..1439)      OPTIONAL,
//!     validityDuration     INTEGER (1..3600)      OPTIONAL
//! }
//! ```

use crate::dynamic_frame::data::DataType;
use crate::dynamic_frame::frame::DynamicFrameVersion;
use crate::error::{UicError, UicResult};
use crate::ticket::fcb_version_from_format;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use uic_asn1::ObjectIdentifier;
use uic_asn1::uper::{UperDecoder, UperEncoder};

const SECURITY_PROVIDER_RANGE: (i64, i64) = (1, 32000);
const KEY_ID_RANGE: (i64, i64) = (0, 99999);
const VALIDITY_YEAR_RANGE: (i64, i64) = (2016, 2269);
const VALIDITY_DAY_RANGE: (i64, i64) = (1, 366);
const VALIDITY_TIME_RANGE: (i64, i64) = (0, 1439);
const VALIDITY_DURATION_RANGE: (i64, i64) = (1, 3600);

/// Level 1 of a Dynamic Frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Level1Data {
    pub security_provider_num: Option<i64>,
    pub security_provider_ia5: Option<String>,
    pub key_id: Option<i64>,
    /// Tagged payloads; normally one of them is an FCB ticket
    pub data_sequence: Vec<DataType>,
    pub level1_key_algorithm: Option<ObjectIdentifier>,
    pub level2_key_algorithm: Option<ObjectIdentifier>,
    pub level1_signing_algorithm: Option<ObjectIdentifier>,
    pub level2_signing_algorithm: Option<ObjectIdentifier>,
    /// Public key for the level-2 signature
    pub level2_public_key: Option<Vec<u8>>,
    pub end_of_validity_year: Option<i64>,
    pub end_of_validity_day: Option<i64>,
    /// Minutes of the day
    pub end_of_validity_time: Option<i64>,
    /// Seconds
    pub validity_duration: Option<i64>,
}

impl Level1Data {
    /// Decode level 1 in the schema of `version`
    pub fn decode(decoder: &mut UperDecoder, version: DynamicFrameVersion) -> UicResult<Self> {
        let optional_count = version.level1_optional_fields();
        let present = decoder.decode_presence_bitmap(optional_count)?;

        let mut data = Level1Data {
            security_provider_num: decode_int_if(decoder, present[0], SECURITY_PROVIDER_RANGE)?,
            security_provider_ia5: present[1].then(|| decoder.decode_ia5_string()).transpose()?,
            key_id: decode_int_if(decoder, present[2], KEY_ID_RANGE)?,
            data_sequence: decoder.decode_sequence_of::<DataType>()?,
            ..Default::default()
        };
        data.level1_key_algorithm = decode_oid_if(decoder, present[3])?;
        data.level2_key_algorithm = decode_oid_if(decoder, present[4])?;
        data.level1_signing_algorithm = decode_oid_if(decoder, present[5])?;
        data.level2_signing_algorithm = decode_oid_if(decoder, present[6])?;
        data.level2_public_key = present[7].then(|| decoder.decode_octet_string()).transpose()?;

        if version == DynamicFrameVersion::V2 {
            data.end_of_validity_year = decode_int_if(decoder, present[8], VALIDITY_YEAR_RANGE)?;
            data.end_of_validity_day = decode_int_if(decoder, present[9], VALIDITY_DAY_RANGE)?;
            data.end_of_validity_time = decode_int_if(decoder, present[10], VALIDITY_TIME_RANGE)?;
            data.validity_duration = decode_int_if(decoder, present[11], VALIDITY_DURATION_RANGE)?;
        }
        Ok(data)
    }

    /// Encode level 1 in the schema of `version`
    ///
    /// # Error Handling
    /// Returns `UnsupportedVersion` if validity fields are set for `U1`, and
    /// `ConstraintViolation` for out-of-range integers.
    pub fn encode(&self, encoder: &mut UperEncoder, version: DynamicFrameVersion) -> UicResult<()> {
        let mut present = vec![
            self.security_provider_num.is_some(),
            self.security_provider_ia5.is_some(),
            self.key_id.is_some(),
            self.level1_key_algorithm.is_some(),
            self.level2_key_algorithm.is_some(),
            self.level1_signing_algorithm.is_some(),
            self.level2_signing_algorithm.is_some(),
            self.level2_public_key.is_some(),
        ];
        let validity = [
            self.end_of_validity_year,
            self.end_of_validity_day,
            self.end_of_validity_time,
            self.validity_duration,
        ];
        match version {
            DynamicFrameVersion::V1 if validity.iter().any(Option::is_some) => {
                return Err(UicError::UnsupportedVersion(
                    "Validity fields need a U2 dynamic frame".to_string(),
                ));
            }
            DynamicFrameVersion::V1 => {}
            DynamicFrameVersion::V2 => present.extend(validity.iter().map(Option::is_some)),
        }
        encoder.encode_presence_bitmap(&present);

        encode_int_if(encoder, self.security_provider_num, SECURITY_PROVIDER_RANGE)?;
        if let Some(provider) = &self.security_provider_ia5 {
            encoder.encode_ia5_string(provider)?;
        }
        encode_int_if(encoder, self.key_id, KEY_ID_RANGE)?;
        encoder.encode_sequence_of(&self.data_sequence)?;
        for oid in [
            &self.level1_key_algorithm,
            &self.level2_key_algorithm,
            &self.level1_signing_algorithm,
            &self.level2_signing_algorithm,
        ]
        .into_iter()
        .flatten()
        {
            encoder.encode_object_identifier(oid)?;
        }
        if let Some(key) = &self.level2_public_key {
            encoder.encode_octet_string(key)?;
        }

        if version == DynamicFrameVersion::V2 {
            encode_int_if(encoder, self.end_of_validity_year, VALIDITY_YEAR_RANGE)?;
            encode_int_if(encoder, self.end_of_validity_day, VALIDITY_DAY_RANGE)?;
            encode_int_if(encoder, self.end_of_validity_time, VALIDITY_TIME_RANGE)?;
            encode_int_if(encoder, self.validity_duration, VALIDITY_DURATION_RANGE)?;
        }
        Ok(())
    }

    /// Security provider, IA5 form preferred over the number
    pub fn security_provider(&self) -> Option<String> {
        match &self.security_provider_ia5 {
            Some(text) if !text.is_empty() => Some(text.clone()),
            _ => self.security_provider_num.map(|n| n.to_string()),
        }
    }

    /// First data item tagged with an FCB format
    pub fn fcb_data(&self) -> Option<&DataType> {
        self.data_sequence
            .iter()
            .find(|item| fcb_version_from_format(&item.format).is_some())
    }

    /// End of validity as UTC date and time
    ///
    /// Needs year and day; a missing time means midnight.
    pub fn end_of_validity(&self) -> Option<NaiveDateTime> {
        let year = i32::try_from(self.end_of_validity_year?).ok()?;
        let day = u32::try_from(self.end_of_validity_day?).ok()?;
        let date = NaiveDate::from_yo_opt(year, day)?;
        let minutes = self.end_of_validity_time.unwrap_or(0);
        date.and_hms_opt(0, 0, 0)?
            .checked_add_signed(Duration::minutes(minutes))
    }

    /// Set year, day and minute of the end of validity
    pub fn set_end_of_validity(&mut self, end: NaiveDateTime) {
        self.end_of_validity_year = Some(i64::from(end.year()));
        self.end_of_validity_day = Some(i64::from(end.ordinal()));
        self.end_of_validity_time = Some(i64::from(end.hour() * 60 + end.minute()));
    }
}

fn decode_int_if(decoder: &mut UperDecoder, present: bool, (min, max): (i64, i64)) -> UicResult<Option<i64>> {
    present
        .then(|| decoder.decode_constrained_integer(min, max))
        .transpose()
}

fn decode_oid_if(decoder: &mut UperDecoder, present: bool) -> UicResult<Option<ObjectIdentifier>> {
    present.then(|| decoder.decode_object_identifier()).transpose()
}

fn encode_int_if(encoder: &mut UperEncoder, value: Option<i64>, (min, max): (i64, i64)) -> UicResult<()> {
    match value {
        Some(value) => encoder.encode_constrained_integer(value, min, max),
        None => Ok(()),
    }
}
