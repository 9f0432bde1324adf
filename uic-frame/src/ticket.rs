//! FCB ticket seam
//!
//! The FCB ticket object model lives outside the frame codecs. Frames hand
//! the raw UPER bytes and the FCB version to a [`TicketCodec`] and get back
//! an [`FcbTicket`]; the only fields the frames themselves read are the
//! issuer and security provider in [`TicketHeader`].

use crate::error::UicResult;
use serde::{Deserialize, Serialize};

/// Dynamic Frame data tags of the FCB versions
pub const FCB_FORMATS: [&str; 3] = ["FCB1", "FCB2", "FCB3"];

/// FCB version carried by a Dynamic Frame data tag (`FCB1` → 1)
pub fn fcb_version_from_format(format: &str) -> Option<u8> {
    FCB_FORMATS
        .iter()
        .position(|tag| *tag == format)
        .map(|index| index as u8 + 1)
}

/// Dynamic Frame data tag for an FCB version
pub fn fcb_format(version: u8) -> String {
    format!("FCB{}", version)
}

/// Issuer and security provider identifiers of a ticket
///
/// Each identifier exists in a numeric and an IA5 form; the IA5 form wins
/// when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHeader {
    pub security_provider_num: Option<i64>,
    pub security_provider_ia5: Option<String>,
    pub issuer_num: Option<i64>,
    pub issuer_ia5: Option<String>,
}

impl TicketHeader {
    /// Issuer code, IA5 form preferred
    pub fn issuer(&self) -> Option<String> {
        preferred(self.issuer_ia5.as_deref(), self.issuer_num)
    }

    /// Security provider code, IA5 form preferred
    pub fn security_provider(&self) -> Option<String> {
        preferred(self.security_provider_ia5.as_deref(), self.security_provider_num)
    }
}

fn preferred(ia5: Option<&str>, num: Option<i64>) -> Option<String> {
    match ia5 {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => num.map(|n| n.to_string()),
    }
}

/// A decoded FCB ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FcbTicket {
    /// FCB schema version (1..=3)
    pub version: u8,
    /// UPER encoding of the ticket
    pub data: Vec<u8>,
    /// Identifiers the frames resolve providers from, if the codec knows them
    pub header: Option<TicketHeader>,
}

/// Converts FCB ticket bytes to tickets and back
#[cfg_attr(test, mockall::automock)]
pub trait TicketCodec {
    /// Decode the UPER bytes of an FCB ticket of the given version
    fn decode(&self, data: &[u8], version: u8) -> UicResult<FcbTicket>;

    /// Encode a ticket to its UPER bytes
    fn encode(&self, ticket: &FcbTicket) -> UicResult<Vec<u8>>;
}

/// Codec that keeps ticket bytes untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTicketCodec;

impl TicketCodec for OpaqueTicketCodec {
    fn decode(&self, data: &[u8], version: u8) -> UicResult<FcbTicket> {
        Ok(FcbTicket {
            version,
            data: data.to_vec(),
            header: None,
        })
    }

    fn encode(&self, ticket: &FcbTicket) -> UicResult<Vec<u8>> {
        Ok(ticket.data.clone())
    }
}
