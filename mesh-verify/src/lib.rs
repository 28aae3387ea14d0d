//! Mesh Verify
//!
//! Re-checks downloaded records against ground truth and classifies each
//! one with a verdict. Verdicts are audit data about the world changing
//! (or a producer misbehaving), never errors.

pub mod engine;
pub mod ground_truth;

pub use engine::{ValidationEngine, ValidationSummary};
pub use ground_truth::{GroundTruth, InMemoryGroundTruth};
