//! Secondary fairness metrics: statistical parity difference, equal
//! opportunity difference, average odds difference.
//!
//! Unlike the bias stage, this stage does not fall back to a random
//! partition: without a usable sensitive column the metric set is all
//! zeros and the outcome records that nothing was measured.

use crate::policy::AuditPolicy;
use crate::types::dataset::{Dataset, PredictionSet};
use crate::types::metrics::FairnessMetricSet;

use super::{positive_rate, GroupPartition, MetricError, PartitionSource};

/// Output of the fairness stage.
#[derive(Debug, Clone)]
pub struct FairnessOutcome {
    /// Serialized metric values.
    pub metrics: FairnessMetricSet,
    /// Partition used, or `None` when no sensitive column was usable and
    /// the zero metric set is unmeasured rather than perfect.
    pub partition: Option<PartitionSource>,
    /// Degradation caveats.
    pub notes: Vec<String>,
}

/// True positive rate: `TP / (TP + FN)`, 0.0 when there are no positives.
pub fn true_positive_rate(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let positives = y_true.iter().filter(|&&y| y == 1).count();
    if positives == 0 {
        return 0.0;
    }
    let true_positives = y_true
        .iter()
        .zip(y_pred)
        .filter(|&(&y, &p)| y == 1 && p == 1)
        .count();
    true_positives as f64 / positives as f64
}

/// False positive rate: `FP / (FP + TN)`, 0.0 when there are no negatives.
pub fn false_positive_rate(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let negatives = y_true.iter().filter(|&&y| y == 0).count();
    if negatives == 0 {
        return 0.0;
    }
    let false_positives = y_true
        .iter()
        .zip(y_pred)
        .filter(|&(&y, &p)| y == 0 && p == 1)
        .count();
    false_positives as f64 / negatives as f64
}

/// TPR restricted to a row subset.
pub(crate) fn subset_tpr(y_true: &[u8], y_pred: &[u8], rows: &[usize]) -> f64 {
    let positives = rows.iter().filter(|&&r| y_true[r] == 1).count();
    if positives == 0 {
        return 0.0;
    }
    let true_positives = rows
        .iter()
        .filter(|&&r| y_true[r] == 1 && y_pred[r] == 1)
        .count();
    true_positives as f64 / positives as f64
}

/// FPR restricted to a row subset.
pub(crate) fn subset_fpr(y_true: &[u8], y_pred: &[u8], rows: &[usize]) -> f64 {
    let negatives = rows.iter().filter(|&&r| y_true[r] == 0).count();
    if negatives == 0 {
        return 0.0;
    }
    let false_positives = rows
        .iter()
        .filter(|&&r| y_true[r] == 0 && y_pred[r] == 1)
        .count();
    false_positives as f64 / negatives as f64
}

/// Compute the fairness metric set over the primary sensitive attribute.
pub fn compute_fairness_metrics(
    dataset: &Dataset,
    predictions: &PredictionSet,
    _policy: &AuditPolicy,
) -> Result<FairnessOutcome, MetricError> {
    if predictions.len() != dataset.labels.len() {
        return Err(MetricError::PredictionMismatch {
            predictions: predictions.len(),
            rows: dataset.labels.len(),
        });
    }

    let partition = dataset
        .primary_sensitive_column()
        .and_then(|c| GroupPartition::from_sensitive_column(dataset, c).map(|p| (c, p)));

    let Some((column, partition)) = partition else {
        return Ok(FairnessOutcome {
            metrics: FairnessMetricSet::default(),
            partition: None,
            notes: vec![
                "No usable sensitive attribute; fairness metrics not measured".to_string()
            ],
        });
    };

    let pred = predictions.labels();
    let p0 = positive_rate(pred, &partition.group0);
    let p1 = positive_rate(pred, &partition.group1);
    let tpr_gap = (subset_tpr(&dataset.labels, pred, &partition.group0)
        - subset_tpr(&dataset.labels, pred, &partition.group1))
    .abs();
    let fpr_gap = (subset_fpr(&dataset.labels, pred, &partition.group0)
        - subset_fpr(&dataset.labels, pred, &partition.group1))
    .abs();

    let metrics = FairnessMetricSet {
        statistical_parity_difference: (p0 - p1).abs(),
        equal_opportunity_difference: tpr_gap,
        average_odds_difference: (tpr_gap + fpr_gap) / 2.0,
    };

    tracing::debug!(
        spd = metrics.statistical_parity_difference,
        eod = metrics.equal_opportunity_difference,
        aod = metrics.average_odds_difference,
        column,
        "fairness metrics computed"
    );

    Ok(FairnessOutcome {
        metrics,
        partition: Some(PartitionSource::SensitiveColumn(column.to_string())),
        notes: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::dataset::{DataOrigin, FeatureTable};

    #[test]
    fn test_true_positive_rate() {
        let y_true = [1, 1, 1, 0, 0];
        let y_pred = [1, 1, 0, 0, 0];
        assert!((true_positive_rate(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_false_positive_rate() {
        let y_true = [1, 1, 0, 0, 0];
        let y_pred = [1, 1, 1, 0, 0];
        assert!((false_positive_rate(&y_true, &y_pred) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rates_with_zero_denominator() {
        assert_eq!(true_positive_rate(&[0, 0], &[1, 1]), 0.0);
        assert_eq!(false_positive_rate(&[1, 1], &[0, 0]), 0.0);
    }

    fn dataset(rows: &[(f64, u8)], sensitive: Vec<String>) -> Dataset {
        let features: Vec<Vec<f64>> = rows.iter().map(|&(s, _)| vec![s]).collect();
        let labels: Vec<u8> = rows.iter().map(|&(_, y)| y).collect();
        Dataset::new(
            FeatureTable::new(vec!["gender".into()], features).unwrap(),
            labels,
            sensitive,
            DataOrigin::File,
        )
        .unwrap()
    }

    #[test]
    fn test_balanced_groups_score_zero() {
        let ds = dataset(
            &[(0.0, 1), (0.0, 0), (1.0, 1), (1.0, 0)],
            vec!["gender".into()],
        );
        let preds = PredictionSet::new(vec![1, 0, 1, 0]);

        let out = compute_fairness_metrics(&ds, &preds, &AuditPolicy::default()).unwrap();
        assert_eq!(out.metrics, FairnessMetricSet::default());
        assert!(out.partition.is_some());
        assert!(out.notes.is_empty());
    }

    #[test]
    fn test_opportunity_gap() {
        // Group 0 gets every positive right; group 1 gets none.
        let ds = dataset(
            &[(0.0, 1), (0.0, 0), (1.0, 1), (1.0, 0)],
            vec!["gender".into()],
        );
        let preds = PredictionSet::new(vec![1, 0, 0, 0]);

        let out = compute_fairness_metrics(&ds, &preds, &AuditPolicy::default()).unwrap();
        assert!((out.metrics.equal_opportunity_difference - 1.0).abs() < 1e-12);
        assert!((out.metrics.average_odds_difference - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_sensitive_column_yields_unmeasured_zeros() {
        let ds = dataset(&[(0.0, 1), (1.0, 0)], vec![]);
        let preds = PredictionSet::new(vec![1, 0]);

        let out = compute_fairness_metrics(&ds, &preds, &AuditPolicy::default()).unwrap();
        assert_eq!(out.metrics, FairnessMetricSet::default());
        assert!(out.partition.is_none());
        assert_eq!(out.notes.len(), 1);
    }

    #[test]
    fn test_prediction_mismatch_rejected() {
        let ds = dataset(&[(0.0, 1), (1.0, 0)], vec!["gender".into()]);
        let preds = PredictionSet::new(vec![1]);
        assert!(matches!(
            compute_fairness_metrics(&ds, &preds, &AuditPolicy::default()),
            Err(MetricError::PredictionMismatch { .. })
        ));
    }
}
