//! Dynamic Frame (DOSIPAS `U1` / `U2`)
//!
//! A UPER-encoded two-level structure: level 1 holds the ticket data and is
//! signed by the issuer, level 2 wraps level 1, its signature and optional
//! dynamic content added at presentation time, and is signed with the key
//! published in level 1.

pub mod content;
pub mod data;
pub mod frame;
pub mod level1;
pub mod level2;
pub mod timestamp;

pub use content::{
    DYNAMIC_CONTENT_FORMAT, ExtensionData, GeoCoordinate, GeoCoordinateSystem, GeoUnit,
    HemisphereLatitude, HemisphereLongitude, UicDynamicContent,
};
pub use data::DataType;
pub use frame::{DynamicFrame, DynamicFrameVersion};
pub use level1::Level1Data;
pub use level2::{Level2Content, Level2Data};
pub use timestamp::TimeStamp;
