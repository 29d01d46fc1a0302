//! Primary bias metrics: demographic parity, equalized odds, disparate
//! impact.
//!
//! All three compare model behavior across the two groups of the primary
//! sensitive attribute. When no usable sensitive column exists the stage
//! degrades to a seeded random partition and says so; the numbers it then
//! produces measure noise, not disparity.

use crate::policy::AuditPolicy;
use crate::types::dataset::{Dataset, PredictionSet};
use crate::types::metrics::{BiasMetricSet, DisparateImpact};

use super::fairness::{subset_fpr, subset_tpr};
use super::{positive_rate, GroupPartition, MetricError, PartitionSource};

/// Output of the bias stage.
#[derive(Debug, Clone)]
pub struct BiasOutcome {
    /// Serialized metric values.
    pub metrics: BiasMetricSet,
    /// Explicit disparate-impact state for the compliance scorer.
    pub disparate_impact: DisparateImpact,
    /// How the rows were partitioned.
    pub partition: PartitionSource,
    /// Degradation caveats (random-partition fallback).
    pub notes: Vec<String>,
}

/// Compute the bias metric set over the primary sensitive attribute.
///
/// Disparate impact is the ratio of group 0's predicted-positive rate to
/// group 1's. Edge policy: both rates zero reads as parity (1.0); a zero
/// rate on either side alone reads as maximal disparity (0.0).
pub fn compute_bias_metrics(
    dataset: &Dataset,
    predictions: &PredictionSet,
    policy: &AuditPolicy,
) -> Result<BiasOutcome, MetricError> {
    if predictions.len() != dataset.labels.len() {
        return Err(MetricError::PredictionMismatch {
            predictions: predictions.len(),
            rows: dataset.labels.len(),
        });
    }

    let (partition, source, mut notes) = resolve_partition(dataset, policy);

    let pred = predictions.labels();
    let p0 = positive_rate(pred, &partition.group0);
    let p1 = positive_rate(pred, &partition.group1);

    let demographic_parity = (p0 - p1).abs();

    let tpr_gap = (subset_tpr(&dataset.labels, pred, &partition.group0)
        - subset_tpr(&dataset.labels, pred, &partition.group1))
    .abs();
    let fpr_gap = (subset_fpr(&dataset.labels, pred, &partition.group0)
        - subset_fpr(&dataset.labels, pred, &partition.group1))
    .abs();
    let equalized_odds = tpr_gap.max(fpr_gap);

    let di = disparate_impact_ratio(p0, p1);

    if matches!(source, PartitionSource::RandomFallback) {
        notes.push(
            "No usable sensitive attribute; bias metrics computed over a random partition"
                .to_string(),
        );
    }

    tracing::debug!(
        demographic_parity,
        equalized_odds,
        disparate_impact = di,
        source = ?source,
        "bias metrics computed"
    );

    Ok(BiasOutcome {
        metrics: BiasMetricSet {
            demographic_parity,
            equalized_odds,
            disparate_impact: di,
        },
        disparate_impact: DisparateImpact::Computed(di),
        partition: source,
        notes,
    })
}

fn resolve_partition(
    dataset: &Dataset,
    policy: &AuditPolicy,
) -> (GroupPartition, PartitionSource, Vec<String>) {
    if let Some(column) = dataset.primary_sensitive_column() {
        if let Some(partition) = GroupPartition::from_sensitive_column(dataset, column) {
            return (
                partition,
                PartitionSource::SensitiveColumn(column.to_string()),
                Vec::new(),
            );
        }
    }
    (
        GroupPartition::random_fallback(dataset.features.num_rows(), policy.seed),
        PartitionSource::RandomFallback,
        Vec::new(),
    )
}

fn disparate_impact_ratio(p0: f64, p1: f64) -> f64 {
    if p1 == 0.0 {
        if p0 == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        p0 / p1
    }
}
