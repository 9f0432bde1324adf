//! Dynamic content (`FDC1`)
//!
//! Data added by the mobile app at presentation time and covered by the
//! level-2 signature: app id, timestamp, position, challenge responses.
//!
//! ```text
//! UicDynamicContentData ::= SEQUENCE {
//!     dynamicContentMobileAppId         IA5String OPTIONAL,
//!     dynamicContentTimeStamp           TimeStamp OPTIONAL,
//!     dynamicContentGeoCoordinate       GeoCoordinateType OPTIONAL,
//!     dynamicContentResponseToChallenge SEQUENCE OF ExtensionData OPTIONAL,
//!     dynamicContentExtension           ExtensionData OPTIONAL,
//!     ...
//! }
//! ```

use crate::dynamic_frame::timestamp::TimeStamp;
use crate::error::{UicError, UicResult};
use serde::{Deserialize, Serialize};
use uic_asn1::uper::{UperDecode, UperDecoder, UperEncode, UperEncoder};

/// Level-2 data tag of [`UicDynamicContent`]
pub const DYNAMIC_CONTENT_FORMAT: &str = "FDC1";

/// ENUMERATED type with its schema indices and DEFAULT value
macro_rules! uper_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $index:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            const COUNT: usize = [$($index),+].len();

            /// Schema index of the value
            pub fn index(&self) -> usize {
                match self {
                    $($name::$variant => $index,)+
                }
            }

            /// Value for a schema index
            pub fn from_index(index: usize) -> UicResult<Self> {
                match index {
                    $($index => Ok($name::$variant),)+
                    other => Err(UicError::Asn1Decoding(format!(
                        "{} index {} out of range",
                        stringify!($name),
                        other
                    ))),
                }
            }

            fn decode_uper(decoder: &mut UperDecoder) -> UicResult<Self> {
                Self::from_index(decoder.decode_enumerated(Self::COUNT)?)
            }

            fn encode_uper(&self, encoder: &mut UperEncoder) -> UicResult<()> {
                encoder.encode_enumerated(self.index(), Self::COUNT)
            }
        }
    };
}

uper_enum!(
    /// Unit of longitude, latitude and accuracy
    GeoUnit {
        MicroDegree = 0,
        TenthMilliDegree = 1,
        MilliDegree = 2,
        CentiDegree = 3,
        DeciDegree = 4,
    } default MilliDegree
);

uper_enum!(
    /// Geodetic reference system
    GeoCoordinateSystem { Wgs84 = 0, Grs80 = 1 } default Wgs84
);

uper_enum!(
    /// Hemisphere of the longitude value
    HemisphereLongitude { North = 0, South = 1 } default North
);

uper_enum!(
    /// Hemisphere of the latitude value
    HemisphereLatitude { East = 0, West = 1 } default East
);

/// A position
///
/// The four enumerations are DEFAULT fields: they are written only when
/// they differ from their default, and read back as the default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub geo_unit: GeoUnit,
    pub coordinate_system: GeoCoordinateSystem,
    pub hemisphere_longitude: HemisphereLongitude,
    pub hemisphere_latitude: HemisphereLatitude,
    pub longitude: i64,
    pub latitude: i64,
    pub accuracy: Option<GeoUnit>,
}

impl GeoCoordinate {
    /// Position in the default unit and reference system
    pub fn new(longitude: i64, latitude: i64) -> Self {
        Self {
            geo_unit: GeoUnit::default(),
            coordinate_system: GeoCoordinateSystem::default(),
            hemisphere_longitude: HemisphereLongitude::default(),
            hemisphere_latitude: HemisphereLatitude::default(),
            longitude,
            latitude,
            accuracy: None,
        }
    }
}

impl UperDecode for GeoCoordinate {
    fn decode_uper(decoder: &mut UperDecoder) -> UicResult<Self> {
        let present = decoder.decode_presence_bitmap(5)?;
        let geo_unit = if present[0] {
            GeoUnit::decode_uper(decoder)?
        } else {
            GeoUnit::default()
        };
        let coordinate_system = if present[1] {
            GeoCoordinateSystem::decode_uper(decoder)?
        } else {
            GeoCoordinateSystem::default()
        };
        let hemisphere_longitude = if present[2] {
            HemisphereLongitude::decode_uper(decoder)?
        } else {
            HemisphereLongitude::default()
        };
        let hemisphere_latitude = if present[3] {
            HemisphereLatitude::decode_uper(decoder)?
        } else {
            HemisphereLatitude::default()
        };
        let longitude = decoder.decode_unconstrained_integer()?;
        let latitude = decoder.decode_unconstrained_integer()?;
        let accuracy = if present[4] {
            Some(GeoUnit::decode_uper(decoder)?)
        } else {
            None
        };
        Ok(Self {
            geo_unit,
            coordinate_system,
            hemisphere_longitude,
            hemisphere_latitude,
            longitude,
            latitude,
            accuracy,
        })
    }
}

impl UperEncode for GeoCoordinate {
    fn encode_uper(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        let geo_unit = self.geo_unit != GeoUnit::default();
        let coordinate_system = self.coordinate_system != GeoCoordinateSystem::default();
        let hemisphere_longitude = self.hemisphere_longitude != HemisphereLongitude::default();
        let hemisphere_latitude = self.hemisphere_latitude != HemisphereLatitude::default();
        encoder.encode_presence_bitmap(&[
            geo_unit,
            coordinate_system,
            hemisphere_longitude,
            hemisphere_latitude,
            self.accuracy.is_some(),
        ]);
        if geo_unit {
            self.geo_unit.encode_uper(encoder)?;
        }
        if coordinate_system {
            self.coordinate_system.encode_uper(encoder)?;
        }
        if hemisphere_longitude {
            self.hemisphere_longitude.encode_uper(encoder)?;
        }
        if hemisphere_latitude {
            self.hemisphere_latitude.encode_uper(encoder)?;
        }
        encoder.encode_unconstrained_integer(self.longitude)?;
        encoder.encode_unconstrained_integer(self.latitude)?;
        if let Some(accuracy) = &self.accuracy {
            accuracy.encode_uper(encoder)?;
        }
        Ok(())
    }
}

/// Identified opaque extension
///
/// ```text
/// ExtensionData ::= SEQUENCE {
///     extensionId   IA5String,
///     extensionData OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionData {
    pub id: String,
    pub data: Vec<u8>,
}

impl UperDecode for ExtensionData {
    fn decode_uper(decoder: &mut UperDecoder) -> UicResult<Self> {
        let id = decoder.decode_ia5_string()?;
        let data = decoder.decode_octet_string()?;
        Ok(Self { id, data })
    }
}

impl UperEncode for ExtensionData {
    fn encode_uper(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_ia5_string(&self.id)?;
        encoder.encode_octet_string(&self.data)
    }
}

/// `FDC1` dynamic content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UicDynamicContent {
    pub mobile_app_id: Option<String>,
    pub time_stamp: Option<TimeStamp>,
    pub geo_coordinate: Option<GeoCoordinate>,
    pub response_to_challenge: Option<Vec<ExtensionData>>,
    pub extension: Option<ExtensionData>,
}

impl UperDecode for UicDynamicContent {
    fn decode_uper(decoder: &mut UperDecoder) -> UicResult<Self> {
        let extended = decoder.decode_extension_marker()?;
        let present = decoder.decode_presence_bitmap(5)?;

        let mobile_app_id = present[0].then(|| decoder.decode_ia5_string()).transpose()?;
        let time_stamp = present[1]
            .then(|| TimeStamp::decode_uper(decoder))
            .transpose()?;
        let geo_coordinate = present[2]
            .then(|| GeoCoordinate::decode_uper(decoder))
            .transpose()?;
        let response_to_challenge = present[3]
            .then(|| decoder.decode_sequence_of::<ExtensionData>())
            .transpose()?;
        let extension = present[4]
            .then(|| ExtensionData::decode_uper(decoder))
            .transpose()?;

        if extended {
            decoder.skip_extensions()?;
        }
        Ok(Self {
            mobile_app_id,
            time_stamp,
            geo_coordinate,
            response_to_challenge,
            extension,
        })
    }
}

impl UperEncode for UicDynamicContent {
    fn encode_uper(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_extension_marker(false);
        encoder.encode_presence_bitmap(&[
            self.mobile_app_id.is_some(),
            self.time_stamp.is_some(),
            self.geo_coordinate.is_some(),
            self.response_to_challenge.is_some(),
            self.extension.is_some(),
        ]);
        if let Some(app_id) = &self.mobile_app_id {
            encoder.encode_ia5_string(app_id)?;
        }
        if let Some(time_stamp) = &self.time_stamp {
            time_stamp.encode_uper(encoder)?;
        }
        if let Some(geo_coordinate) = &self.geo_coordinate {
            geo_coordinate.encode_uper(encoder)?;
        }
        if let Some(responses) = &self.response_to_challenge {
            encoder.encode_sequence_of(responses)?;
        }
        if let Some(extension) = &self.extension {
            extension.encode_uper(encoder)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uic_asn1::uper::{from_uper_bytes, to_uper_bytes};

    #[test]
    fn test_defaults_are_not_written() {
        let position = GeoCoordinate::new(12_345, -6_789);
        let mut encoder = UperEncoder::new();
        position.encode_uper(&mut encoder).unwrap();
        // bitmap 5 bits, then two 8-bit lengths with 2 octets each
        assert_eq!(encoder.position(), 5 + 2 * (8 + 16));

        let mut explicit = position.clone();
        explicit.hemisphere_latitude = HemisphereLatitude::West;
        explicit.geo_unit = GeoUnit::MicroDegree;
        explicit.accuracy = Some(GeoUnit::CentiDegree);
        let bytes = to_uper_bytes(&explicit).unwrap();
        assert_eq!(bytes[0] >> 3, 0b10011);
        assert_eq!(from_uper_bytes::<GeoCoordinate>(&bytes).unwrap(), explicit);
    }

    #[test]
    fn test_enum_index() {
        assert_eq!(GeoUnit::default(), GeoUnit::MilliDegree);
        assert_eq!(HemisphereLatitude::default(), HemisphereLatitude::East);
        assert_eq!(GeoUnit::DeciDegree.index(), 4);
        assert_eq!(GeoUnit::from_index(1).unwrap(), GeoUnit::TenthMilliDegree);
        assert!(GeoUnit::from_index(5).is_err());
    }

    #[test]
    fn test_dynamic_content_roundtrip() {
        let content = UicDynamicContent {
            mobile_app_id: Some("app-42".to_string()),
            time_stamp: Some(TimeStamp { day: 100, time: 3600 }),
            geo_coordinate: Some(GeoCoordinate::new(5_123_456, 52_456_789)),
            response_to_challenge: Some(vec![ExtensionData {
                id: "nonce".to_string(),
                data: vec![1, 2, 3],
            }]),
            extension: None,
        };
        let bytes = to_uper_bytes(&content).unwrap();
        assert_eq!(bytes[0] >> 2, 0b011110);
        assert_eq!(from_uper_bytes::<UicDynamicContent>(&bytes).unwrap(), content);
    }

    #[test]
    fn test_extension_additions_skipped() {
        let mut encoder = UperEncoder::new();
        encoder.encode_extension_marker(true);
        encoder.encode_presence_bitmap(&[false, true, false, false, false]);
        TimeStamp { day: 2, time: 10 }.encode_uper(&mut encoder).unwrap();
        // one addition, present, two octets of open type
        encoder.encode_normally_small_length(1).unwrap();
        encoder.encode_presence_bitmap(&[true]);
        encoder.encode_octet_string(&[0xDE, 0xAD]).unwrap();
        encoder.encode_ia5_string("tail").unwrap();
        let bytes = encoder.into_bytes();

        let mut decoder = UperDecoder::new(&bytes);
        let content = UicDynamicContent::decode_uper(&mut decoder).unwrap();
        assert_eq!(content.time_stamp, Some(TimeStamp { day: 2, time: 10 }));
        assert_eq!(decoder.decode_ia5_string().unwrap(), "tail");
    }
}
