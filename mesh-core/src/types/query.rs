//! Query and query-result types
//!
//! Queries are stateless: constructed per request, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Record, RecordSource};
use crate::identity::PeerId;

/// A filtered record query sent to producers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Exact source to match
    pub source: RecordSource,
    /// Keyword filters; a record matches when its searchable text contains
    /// at least one keyword (case-insensitive). Empty = no keyword filter.
    pub keywords: Vec<String>,
    /// Label filters; a record matches when its label is in this set.
    /// Empty = no label filter.
    pub labels: Vec<String>,
    /// Inclusive lower bound on `captured_at`
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `captured_at`
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of records to return
    pub limit: usize,
}

impl RecordQuery {
    /// Create a query matching everything from `source`, up to `limit`
    pub fn new(source: RecordSource, limit: usize) -> Self {
        Self {
            source,
            keywords: Vec::new(),
            labels: Vec::new(),
            start_time: None,
            end_time: None,
            limit,
        }
    }

    /// Add keyword filters
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Add label filters
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Restrict to a capture-time range
    pub fn with_time_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }
}

/// Outcome of one endpoint within a fanout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    /// Endpoint replied in time (possibly with zero matches)
    Success,
    /// Endpoint replied with an error; treated as zero matches
    Error,
    /// No reply before the deadline
    Timeout,
}

/// A query result from one producer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Responding producer
    pub producer: PeerId,
    /// Matched records, at most `limit` of them
    pub records: Vec<Record>,
    /// How the endpoint resolved
    pub status: EndpointStatus,
}

impl QueryResult {
    /// Successful response
    pub fn success(producer: PeerId, records: Vec<Record>) -> Self {
        Self {
            producer,
            records,
            status: EndpointStatus::Success,
        }
    }

    /// Failed response, counted as zero matches
    pub fn error(producer: PeerId) -> Self {
        Self {
            producer,
            records: Vec::new(),
            status: EndpointStatus::Error,
        }
    }

    /// No reply before the deadline
    pub fn timeout(producer: PeerId) -> Self {
        Self {
            producer,
            records: Vec::new(),
            status: EndpointStatus::Timeout,
        }
    }
}
