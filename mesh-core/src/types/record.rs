//! Record - the atomic unit of collected data
//!
//! A record is produced once at scrape time and immutable thereafter.
//! Verifiers download records and re-check them against ground truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a record was collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Listing portal
    Portal,
    /// Public property registry
    Registry,
    /// Classifieds site
    Classifieds,
}

impl RecordSource {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portal => "portal",
            Self::Registry => "registry",
            Self::Classifieds => "classifieds",
        }
    }
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A collected record
///
/// Invariants: `payload_size` always equals `payload.len()`; `uri` is
/// unique per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier of the underlying item
    pub uri: String,
    /// When the producer captured this record
    pub captured_at: DateTime<Utc>,
    /// Collection source
    pub source: RecordSource,
    /// Optional classification tag (e.g. a geographic partition)
    pub label: Option<String>,
    /// Raw captured content
    pub payload: Vec<u8>,
    /// Byte length of `payload`
    pub payload_size: u64,
}

impl Record {
    /// Create a record, deriving `payload_size` from the payload
    pub fn new(
        uri: impl Into<String>,
        source: RecordSource,
        label: Option<String>,
        payload: Vec<u8>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let payload_size = payload.len() as u64;
        Self {
            uri: uri.into(),
            captured_at,
            source,
            label,
            payload,
            payload_size,
        }
    }

    /// Text searched by keyword queries: uri, label, and payload content
    pub fn searchable_text(&self) -> String {
        let mut text = self.uri.clone();
        if let Some(label) = &self.label {
            text.push(' ');
            text.push_str(label);
        }
        if let Ok(body) = std::str::from_utf8(&self.payload) {
            text.push(' ');
            text.push_str(body);
        }
        text
    }
}

/// Status of a listing at the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Listed and available
    Active,
    /// Under offer
    Pending,
    /// Sale completed
    Sold,
    /// Withdrawn by the seller
    Withdrawn,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Sold => "sold",
            Self::Withdrawn => "withdrawn",
        };
        write!(f, "{}", s)
    }
}

/// Parsed record payload for the listing domain
///
/// The tracked fields (`price`, `status`) are what the validation engine
/// compares against ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPayload {
    /// Asking price in minor currency units
    pub price: i64,
    /// Listing status at capture time
    pub status: ListingStatus,
    /// Street address
    pub address: String,
    /// Living area in square meters
    pub area_sqm: Option<u32>,
    /// Number of rooms
    pub rooms: Option<u8>,
}

impl ListingPayload {
    /// Serialize to record payload bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        // serde_json never fails on this shape
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Parse from record payload bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
