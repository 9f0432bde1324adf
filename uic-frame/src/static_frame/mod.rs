//! Static Frame (`#UT`)
//!
//! A fixed ASCII header with a signature slot, followed by a zlib payload of
//! tagged records. `U_HEAD`, `U_TLAY` and `U_FLEX` have dedicated parsers;
//! every other record is kept as tag, version and content.

pub mod flex;
pub mod frame;
pub mod header;
pub mod layout;
pub mod record;
pub mod signature;

pub use flex::FlexRecord;
pub use frame::StaticFrame;
pub use header::HeaderRecord;
pub use layout::{LayoutField, LayoutRecord};
pub use record::DataRecord;
