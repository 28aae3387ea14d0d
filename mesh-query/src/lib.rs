//! Mesh Query
//!
//! On-demand fanout: a verifier broadcasts a filtered query to every
//! registered producer endpoint and aggregates whatever arrives before a
//! single global deadline. Slow or dead producers cost nothing beyond the
//! deadline itself.

pub mod endpoint;
pub mod error;
pub mod fanout;
pub mod handler;

pub use endpoint::{FaultMode, QueryEndpoint, SimulatedEndpoint};
pub use error::{QueryError, QueryOpResult};
pub use fanout::{FanoutEngine, FanoutOutcome};
pub use handler::LocalQueryHandler;
