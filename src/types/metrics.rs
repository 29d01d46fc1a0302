//! Metric value types for bias, fairness, and explainability stages.

use serde::{Deserialize, Serialize};

/// Group-disparity statistics between the two sensitive-attribute groups.
///
/// The serialized shape is exactly these three keys, each a non-negative
/// float defaulting to 0.0 — including when an individual metric's
/// computation failed and was defaulted by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BiasMetricSet {
    /// Absolute gap in predicted-positive rate between the groups.
    pub demographic_parity: f64,
    /// Larger of the TPR gap and the FPR gap between the groups.
    pub equalized_odds: f64,
    /// Ratio of group 0's positive rate to group 1's. 1.0 indicates parity;
    /// 0.0 is the sentinel for undefined/maximal disparity.
    pub disparate_impact: f64,
}

/// Explicit disparate-impact state carried alongside [`BiasMetricSet`].
///
/// The serialized metric set keeps the plain-float contract; this tri-state
/// is what the compliance scorer consumes, so a legitimately measured 0.0
/// ratio is never confused with "the metric was not computed".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisparateImpact {
    /// The ratio was measured.
    Computed(f64),
    /// The bias stage ran but the ratio computation failed.
    Failed,
    /// The bias stage did not run for this audit type.
    NotEvaluated,
}

impl DisparateImpact {
    /// The measured ratio, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Computed(v) => Some(*v),
            _ => None,
        }
    }
}

/// Secondary group-wise parity/opportunity statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FairnessMetricSet {
    /// Absolute gap in predicted-positive rate between the groups.
    pub statistical_parity_difference: f64,
    /// Absolute TPR gap between the groups.
    pub equal_opportunity_difference: f64,
    /// Mean of the absolute TPR gap and the absolute FPR gap.
    pub average_odds_difference: f64,
}

/// One feature's attribution importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    /// Feature (column) name.
    pub name: String,
    /// Mean absolute attribution across the evaluation sample.
    pub importance: f64,
}

/// Feature-attribution output of the explainability stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExplainabilityResult {
    /// Per-feature importance, in dataset column order (keys unique).
    pub feature_importance: Vec<FeatureWeight>,
    /// Up to five feature names, descending by importance.
    pub top_features: Vec<String>,
    /// Raw per-row, per-feature attributions for the first rows of the
    /// evaluation sample. For inspection only, not a statistical summary.
    pub attribution_sample: Vec<Vec<f64>>,
}

impl ExplainabilityResult {
    /// The explicitly empty result used for model variants the kernel does
    /// not attribute (a scope limitation, not a failure).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any feature importance was produced.
    pub fn has_feature_importance(&self) -> bool {
        !self.feature_importance.is_empty()
    }

    /// Look up a feature's importance by name.
    pub fn importance_of(&self, name: &str) -> Option<f64> {
        self.feature_importance
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.importance)
    }
}
