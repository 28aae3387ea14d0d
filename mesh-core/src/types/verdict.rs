//! Validation verdicts
//!
//! Classification of a downloaded record against re-fetched ground truth.
//! Verdicts are audit data, not faults.

use serde::{Deserialize, Serialize};

use super::record::ListingStatus;

/// Verdict for one sampled record
///
/// Variants are mutually exclusive and checked in priority order:
/// Corrupted > NotFound > StatusChanged > ValueChanged > Match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ValidationVerdict {
    /// Record agrees with ground truth on all tracked fields
    Match,
    /// The source no longer has the record
    NotFound,
    /// A tracked value field differs materially
    ValueChanged {
        /// Which field diverged
        field: String,
        /// Value the producer claimed
        claimed: String,
        /// Value observed at the source
        observed: String,
    },
    /// The tracked status field differs
    StatusChanged {
        /// Status the producer claimed
        claimed: ListingStatus,
        /// Status observed at the source
        observed: ListingStatus,
    },
    /// The producer's payload fails schema validation outright
    Corrupted,
}

impl ValidationVerdict {
    /// True only for `Match`
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }

    /// Short tag for logs and summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::NotFound => "not_found",
            Self::ValueChanged { .. } => "value_changed",
            Self::StatusChanged { .. } => "status_changed",
            Self::Corrupted => "corrupted",
        }
    }
}
