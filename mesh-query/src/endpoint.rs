//! Producer endpoints for fanout

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mesh_core::{PeerId, Record, RecordQuery};

use crate::error::{QueryError, QueryOpResult};
use crate::handler::LocalQueryHandler;

/// One queryable producer
#[async_trait]
pub trait QueryEndpoint: Send + Sync {
    /// Producer identity behind this endpoint
    fn producer(&self) -> &PeerId;

    /// Evaluate a query; may take arbitrarily long or never return
    async fn query(&self, query: &RecordQuery) -> QueryOpResult<Vec<Record>>;
}

/// Fault injection for endpoint behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Answer immediately
    None,
    /// Answer after a fixed delay
    Latency(Duration),
    /// Fail every query
    Failing,
    /// Never answer
    Unresponsive,
}

/// Endpoint wrapping a local handler, with optional fault injection
///
/// Stands in for a remote producer in tests and simulations.
pub struct SimulatedEndpoint {
    producer: PeerId,
    handler: Arc<LocalQueryHandler>,
    fault: FaultMode,
}

impl SimulatedEndpoint {
    pub fn new(producer: PeerId, handler: Arc<LocalQueryHandler>) -> Self {
        Self {
            producer,
            handler,
            fault: FaultMode::None,
        }
    }

    pub fn with_fault(mut self, fault: FaultMode) -> Self {
        self.fault = fault;
        self
    }
}

#[async_trait]
impl QueryEndpoint for SimulatedEndpoint {
    fn producer(&self) -> &PeerId {
        &self.producer
    }

    async fn query(&self, query: &RecordQuery) -> QueryOpResult<Vec<Record>> {
        match self.fault {
            FaultMode::None => {}
            FaultMode::Latency(delay) => tokio::time::sleep(delay).await,
            FaultMode::Failing => {
                return Err(QueryError::Rejected(format!(
                    "simulated failure at {}",
                    self.producer
                )))
            }
            FaultMode::Unresponsive => std::future::pending::<()>().await,
        }
        Ok(self.handler.handle(query).await)
    }
}
