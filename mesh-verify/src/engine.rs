//! Record validation
//!
//! Each sampled record is parsed and compared against a fresh lookup of
//! the same item. Exactly one verdict applies; the checks run in a fixed
//! priority order so a record that is both unparseable and missing at the
//! source still classifies as corrupted.

use std::collections::HashMap;
use std::sync::Arc;

use mesh_core::{ListingPayload, Record, ValidationVerdict};
use rand::Rng;
use tracing::{debug, info};

use crate::ground_truth::GroundTruth;

/// Relative price change below this fraction is noise, not a divergence
const DEFAULT_PRICE_TOLERANCE: f64 = 0.005;

/// Tally of verdicts over one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total: usize,
    pub counts: HashMap<&'static str, usize>,
}

impl ValidationSummary {
    fn record(&mut self, verdict: &ValidationVerdict) {
        self.total += 1;
        *self.counts.entry(verdict.kind()).or_insert(0) += 1;
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }
}

/// Classifies downloaded records against ground truth
pub struct ValidationEngine {
    ground_truth: Arc<dyn GroundTruth>,
    price_tolerance: f64,
}

impl ValidationEngine {
    pub fn new(ground_truth: Arc<dyn GroundTruth>) -> Self {
        Self {
            ground_truth,
            price_tolerance: DEFAULT_PRICE_TOLERANCE,
        }
    }

    /// Override the relative price tolerance
    pub fn with_price_tolerance(mut self, tolerance: f64) -> Self {
        self.price_tolerance = tolerance;
        self
    }

    /// Classify one record
    pub async fn validate(&self, record: &Record) -> ValidationVerdict {
        let claimed = match ListingPayload::from_bytes(&record.payload) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(uri = %record.uri, error = %e, "payload failed schema validation");
                return ValidationVerdict::Corrupted;
            }
        };

        let observed = match self.ground_truth.lookup(&record.uri).await {
            Some(payload) => payload,
            None => return ValidationVerdict::NotFound,
        };

        if claimed.status != observed.status {
            return ValidationVerdict::StatusChanged {
                claimed: claimed.status,
                observed: observed.status,
            };
        }

        if self.price_diverged(claimed.price, observed.price) {
            return ValidationVerdict::ValueChanged {
                field: "price".to_string(),
                claimed: claimed.price.to_string(),
                observed: observed.price.to_string(),
            };
        }

        ValidationVerdict::Match
    }

    fn price_diverged(&self, claimed: i64, observed: i64) -> bool {
        if claimed == observed {
            return false;
        }
        let base = claimed.abs().max(1) as f64;
        let diff = (claimed - observed).abs() as f64;
        diff / base >= self.price_tolerance
    }

    /// Classify every record, returning verdicts in input order
    pub async fn validate_all(
        &self,
        records: &[Record],
    ) -> (Vec<(String, ValidationVerdict)>, ValidationSummary) {
        let mut verdicts = Vec::with_capacity(records.len());
        let mut summary = ValidationSummary::default();
        for record in records {
            let verdict = self.validate(record).await;
            summary.record(&verdict);
            verdicts.push((record.uri.clone(), verdict));
        }
        info!(total = summary.total, "validation run complete");
        (verdicts, summary)
    }

    /// Classify a random sample of the records
    ///
    /// `rate` is the inclusion probability per record, clamped to [0, 1].
    pub async fn validate_sample(
        &self,
        records: &[Record],
        rate: f64,
    ) -> (Vec<(String, ValidationVerdict)>, ValidationSummary) {
        let rate = rate.clamp(0.0, 1.0);
        let mut rng = rand::thread_rng();
        let sampled: Vec<Record> = records
            .iter()
            .filter(|_| rng.gen_bool(rate))
            .cloned()
            .collect();
        debug!(sampled = sampled.len(), of = records.len(), "sampling records");
        self.validate_all(&sampled).await
    }
}
