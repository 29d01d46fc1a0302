//! Group partitioning shared by the bias and fairness stages.
//!
//! Every group metric reduces to rates over a two-way row partition. The
//! partition is built once per stage from the primary sensitive column;
//! rows whose sensitive value is neither 0 nor 1 are excluded rather than
//! coerced.

pub mod bias;
pub mod fairness;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::dataset::Dataset;

/// Error type for metric computation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetricError {
    /// Predictions are not aligned with the dataset.
    #[error("Prediction count {predictions} does not match row count {rows}")]
    PredictionMismatch {
        /// Number of predictions.
        predictions: usize,
        /// Number of dataset rows.
        rows: usize,
    },
}

/// How the two-way partition was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionSource {
    /// Split on a binary sensitive column.
    SensitiveColumn(String),
    /// No usable sensitive column; rows were split by a seeded coin flip.
    /// Metrics over this partition measure noise, not group disparity.
    RandomFallback,
}

/// Row indices of the two sensitive-attribute groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPartition {
    /// Rows with sensitive value 0.
    pub group0: Vec<usize>,
    /// Rows with sensitive value 1.
    pub group1: Vec<usize>,
}

impl GroupPartition {
    /// Partition rows on a binary sensitive column.
    ///
    /// Rows whose value is neither exactly 0.0 nor 1.0 are excluded.
    /// Returns `None` when the column does not exist.
    pub fn from_sensitive_column(dataset: &Dataset, column: &str) -> Option<Self> {
        let idx = dataset.features.column_index(column)?;
        let mut group0 = Vec::new();
        let mut group1 = Vec::new();
        for (row, value) in dataset.features.column_values(idx).into_iter().enumerate() {
            if value == 0.0 {
                group0.push(row);
            } else if value == 1.0 {
                group1.push(row);
            }
        }
        Some(Self { group0, group1 })
    }

    /// Seeded coin-flip partition over all rows. Degraded mode only.
    pub fn random_fallback(num_rows: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut group0 = Vec::new();
        let mut group1 = Vec::new();
        for row in 0..num_rows {
            if rng.gen_bool(0.5) {
                group1.push(row);
            } else {
                group0.push(row);
            }
        }
        Self { group0, group1 }
    }

    /// Whether either side is empty (group metrics undefined).
    pub fn has_empty_side(&self) -> bool {
        self.group0.is_empty() || self.group1.is_empty()
    }
}

/// Fraction of the given rows with a positive (1) label.
pub(crate) fn positive_rate(labels: &[u8], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let positives = rows.iter().filter(|&&r| labels[r] == 1).count();
    positives as f64 / rows.len() as f64
}
