//! Query fanout with a single global deadline
//!
//! Every endpoint is queried concurrently. One deadline covers the whole
//! fanout: whatever has not answered when it passes is recorded as a
//! timeout, and its task is left to drain detached; a late reply is
//! simply discarded. Results are aggregated in endpoint order, so the
//! outcome is stable regardless of arrival order.

use std::sync::Arc;
use std::time::Duration;

use mesh_core::{EndpointStatus, MeshConfig, QueryResult, Record, RecordQuery};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::endpoint::QueryEndpoint;
use crate::error::QueryError;

/// Aggregated outcome of one fanout
#[derive(Debug)]
pub struct FanoutOutcome {
    /// Concatenated records in endpoint order, truncated at the limit
    pub records: Vec<Record>,
    /// Per-endpoint results, one per endpoint, in endpoint order
    pub results: Vec<QueryResult>,
    /// Wall time the fanout took
    pub elapsed: Duration,
}

impl FanoutOutcome {
    /// Endpoints that resolved with `status`
    pub fn count_with_status(&self, status: EndpointStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Broadcasts queries to producer endpoints under one deadline
pub struct FanoutEngine {
    timeout: Duration,
}

impl FanoutEngine {
    pub fn new(config: &MeshConfig) -> Self {
        Self {
            timeout: config.query_timeout(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Query every endpoint and aggregate what arrives in time
    pub async fn fanout(
        &self,
        endpoints: &[Arc<dyn QueryEndpoint>],
        query: &RecordQuery,
    ) -> FanoutOutcome {
        let started = Instant::now();
        let deadline = started + self.timeout;

        let handles: Vec<_> = endpoints
            .iter()
            .map(|endpoint| {
                let endpoint = endpoint.clone();
                let query = query.clone();
                tokio::spawn(async move { endpoint.query(&query).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (endpoint, handle) in endpoints.iter().zip(handles) {
            let producer = endpoint.producer().clone();
            let result = match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(Ok(records))) => {
                    debug!(producer = %producer, records = records.len(), "endpoint answered");
                    QueryResult::success(producer, records)
                }
                Ok(Ok(Err(e))) => {
                    warn!(producer = %producer, error = %e, "endpoint failed");
                    QueryResult::error(producer)
                }
                Ok(Err(join_error)) => {
                    let e = QueryError::TaskFailed(join_error.to_string());
                    warn!(producer = %producer, error = %e, "endpoint task failed");
                    QueryResult::error(producer)
                }
                // Dropping the handle detaches the task; untrusted peers
                // are not expected to honor cancellation anyway
                Err(_) => {
                    warn!(producer = %producer, "endpoint missed the deadline");
                    QueryResult::timeout(producer)
                }
            };
            results.push(result);
        }

        let mut records = Vec::new();
        for result in &results {
            for record in &result.records {
                if records.len() >= query.limit {
                    break;
                }
                records.push(record.clone());
            }
        }

        let elapsed = started.elapsed();
        info!(
            endpoints = results.len(),
            records = records.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "fanout complete"
        );
        FanoutOutcome {
            records,
            results,
            elapsed,
        }
    }
}
