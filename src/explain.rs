//! Feature attribution for tabular estimators.
//!
//! Attribution runs over a bounded prefix of the evaluation data
//! (`policy.explain_sample_rows`) to keep cost independent of dataset
//! size. Two closed-form methods:
//!
//! - **Tree ensembles**: the value delta at each split along a row's
//!   decision path is credited to the feature tested there; per-tree
//!   attributions are averaged across the ensemble
//! - **Linear models**: mean-baseline occlusion; a feature's attribution
//!   is the probability shift from replacing it with the sample mean
//!
//! The network variants expose no per-feature structure and yield the
//! explicitly empty result: a scope limitation, not a failure.

use crate::model::{Estimator, LoadedModel, ModelError, TreeEnsemble};
use crate::policy::AuditPolicy;
use crate::types::dataset::{Dataset, FeatureTable};
use crate::types::metrics::{ExplainabilityResult, FeatureWeight};

/// Compute feature attributions for the audit's model over the dataset.
///
/// Errors only on a shape disagreement between the model and the feature
/// table; unattributable model variants return [`ExplainabilityResult::empty`].
pub fn compute_explainability(
    model: &LoadedModel,
    dataset: &Dataset,
    policy: &AuditPolicy,
) -> Result<ExplainabilityResult, ModelError> {
    let Some(estimator) = model.as_estimator() else {
        tracing::debug!(format = %model.format(), "model variant not attributable");
        return Ok(ExplainabilityResult::empty());
    };

    let sample = dataset.features.head(policy.explain_sample_rows);
    if sample.num_rows() == 0 {
        return Ok(ExplainabilityResult::empty());
    }
    if sample.num_columns() != estimator.num_features() {
        return Err(ModelError::Prediction(format!(
            "dataset has {} features, model expects {}",
            sample.num_columns(),
            estimator.num_features()
        )));
    }

    let attributions = match estimator {
        Estimator::Trees(ensemble) => tree_attributions(ensemble, &sample),
        Estimator::Linear(linear) => {
            let baseline = sample.column_means();
            let mut rows = Vec::with_capacity(sample.num_rows());
            for row in sample.rows() {
                let base = linear.probability(row)?;
                let mut attribution = Vec::with_capacity(row.len());
                for j in 0..row.len() {
                    let mut occluded = row.clone();
                    occluded[j] = baseline[j];
                    attribution.push(base - linear.probability(&occluded)?);
                }
                rows.push(attribution);
            }
            rows
        }
    };

    Ok(summarize(&sample, attributions, policy))
}

/// Decision-path attribution, averaged across the ensemble's trees.
fn tree_attributions(ensemble: &TreeEnsemble, sample: &FeatureTable) -> Vec<Vec<f64>> {
    let num_trees = ensemble.trees.len() as f64;
    sample
        .rows()
        .iter()
        .map(|row| {
            let mut attribution = vec![0.0; sample.num_columns()];
            for tree in &ensemble.trees {
                tree.root.attribute(row, &mut attribution);
            }
            for a in &mut attribution {
                *a /= num_trees;
            }
            attribution
        })
        .collect()
}

fn summarize(
    sample: &FeatureTable,
    attributions: Vec<Vec<f64>>,
    policy: &AuditPolicy,
) -> ExplainabilityResult {
    let n = attributions.len() as f64;
    let mut importance = vec![0.0; sample.num_columns()];
    for row in &attributions {
        for (j, a) in row.iter().enumerate() {
            importance[j] += a.abs();
        }
    }
    for v in &mut importance {
        *v /= n;
    }

    let feature_importance: Vec<FeatureWeight> = sample
        .columns()
        .iter()
        .zip(&importance)
        .map(|(name, &importance)| FeatureWeight {
            name: name.clone(),
            importance,
        })
        .collect();

    // Descending by importance, ties broken by column order.
    let mut ranked: Vec<&FeatureWeight> = feature_importance.iter().collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top_features = ranked
        .iter()
        .take(policy.top_feature_count)
        .map(|w| w.name.clone())
        .collect();

    let attribution_sample = attributions
        .into_iter()
        .take(policy.attribution_sample_rows)
        .collect();

    ExplainabilityResult {
        feature_importance,
        top_features,
        attribution_sample,
    }
}
