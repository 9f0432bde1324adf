//! Barcode frame classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame family of a raw barcode payload
///
/// A pure classification value: the frame detector produces it before any
/// structural decoding, the decoders refine the version afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    /// Legacy `#UT` frame, version 1 or 2
    StaticFrame { version: u8 },
    /// UPER-encoded frame; `None` until the decoder has read the format token
    DynamicFrame { version: Option<u8> },
    /// Fixed 114-byte bit-packed frame
    SsbFrame,
    Unknown,
}

impl FrameType {
    /// Check if the classification failed
    pub fn is_unknown(&self) -> bool {
        matches!(self, FrameType::Unknown)
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameType::StaticFrame { version } => write!(f, "static frame v{}", version),
            FrameType::DynamicFrame { version: Some(v) } => write!(f, "dynamic frame v{}", v),
            FrameType::DynamicFrame { version: None } => write!(f, "dynamic frame"),
            FrameType::SsbFrame => write!(f, "SSB frame"),
            FrameType::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_display() {
        assert_eq!(FrameType::StaticFrame { version: 2 }.to_string(), "static frame v2");
        assert_eq!(FrameType::DynamicFrame { version: None }.to_string(), "dynamic frame");
        assert!(FrameType::Unknown.is_unknown());
        assert!(!FrameType::SsbFrame.is_unknown());
    }
}
