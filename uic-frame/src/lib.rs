//! Frame codecs for UIC railway ticket barcodes
//!
//! # Frame Formats
//!
//! - **Static Frame**: `#UT` ASCII header, DSA/ECDSA signature slot and a
//!   zlib-compressed sequence of fixed-layout records
//! - **Dynamic Frame**: nested UPER structure with a level-1 signature over
//!   the ticket data and a level-2 signature over level 1 plus dynamic
//!   content
//! - **SSB Frame**: 114-byte bit-packed frame; only the header and
//!   signature are interpreted here
//!
//! The FCB ticket carried inside every frame is handled through the
//! [`TicketCodec`] seam and treated as opaque by this crate.

pub mod compression;
pub mod dynamic_frame;
pub mod error;
pub mod ssb;
pub mod static_frame;
pub mod ticket;

pub use dynamic_frame::{
    DataType, DynamicFrame, DynamicFrameVersion, GeoCoordinate, Level1Data, Level2Content,
    Level2Data, TimeStamp, UicDynamicContent,
};
pub use ssb::SsbFrame;
pub use static_frame::{DataRecord, FlexRecord, HeaderRecord, LayoutField, LayoutRecord, StaticFrame};
pub use ticket::{FcbTicket, OpaqueTicketCodec, TicketCodec, TicketHeader};
