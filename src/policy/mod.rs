//! AuditPolicy: immutable thresholds, weights, and defaults.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Floats are quantized to integers before hashing to avoid cross-platform
//! and cross-language serialization differences. The quantization factor
//! is 1e6 (multiply by 1,000,000 and round to i64).
//!
//! The policy is fixed at engine construction and never mutated; its
//! `params_hash` travels in every result's provenance so consumers can tell
//! which thresholds governed an audit.

pub mod compliance;
pub mod advisor;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_POLICY_VERSION;

/// Quantization factor for float normalization.
/// Floats are multiplied by this value and rounded to i64.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Error type for policy validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PolicyError {
    /// Compliance weights do not sum to 1.0.
    #[error("Compliance weights sum to {0}, expected 1.0")]
    WeightsNotNormalized(f64),
    /// A threshold lies outside [0, 1].
    #[error("Threshold {name} = {value} outside [0, 1]")]
    ThresholdOutOfRange {
        /// Threshold name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Weights for the four compliance sub-scores.
///
/// Must sum to 1.0 so the overall score stays in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceWeights {
    /// Weight of the transparency sub-score.
    pub transparency: f64,
    /// Weight of the accountability sub-score.
    pub accountability: f64,
    /// Weight of the fairness sub-score.
    pub fairness: f64,
    /// Weight of the safety sub-score.
    pub safety: f64,
}

impl ComplianceWeights {
    /// Sum of the four weights.
    pub fn sum(&self) -> f64 {
        self.transparency + self.accountability + self.fairness + self.safety
    }
}

impl Default for ComplianceWeights {
    fn default() -> Self {
        Self {
            transparency: 0.2,
            accountability: 0.2,
            fairness: 0.4,
            safety: 0.2,
        }
    }
}

impl ComplianceWeights {
    fn to_quantized(self) -> QuantizedWeights {
        QuantizedWeights {
            transparency: quantize_float(self.transparency),
            accountability: quantize_float(self.accountability),
            fairness: quantize_float(self.fairness),
            safety: quantize_float(self.safety),
        }
    }
}

/// Quantize a float to an i64 for deterministic hashing.
fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

/// Quantized compliance weights for deterministic hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuantizedWeights {
    transparency: i64,
    accountability: i64,
    fairness: i64,
    safety: i64,
}

/// Quantized policy parameters for deterministic hashing.
///
/// All floats are quantized to i64 to ensure cross-platform consistency.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuantizedPolicyParams {
    version: String,
    default_sensitive: Vec<String>,
    synthetic_sensitive: Vec<String>,
    synthetic_rows: usize,
    synthetic_features: usize,
    seed: u64,
    explain_sample_rows: usize,
    attribution_sample_rows: usize,
    top_feature_count: usize,
    warn_demographic_parity: i64,
    warn_disparate_impact: i64,
    warn_fairness_score: i64,
    warn_overall: i64,
    recommend_demographic_parity: i64,
    recommend_overall: i64,
    transparency_present: i64,
    transparency_absent: i64,
    accountability_credit: i64,
    safety_factor: i64,
    weights: QuantizedWeights,
}

/// Audit policy version 1.
///
/// Owns every constant the pipeline consults: default sensitive-attribute
/// names, synthesis parameters, sampling bounds, warning/recommendation
/// thresholds, and compliance weights.
///
/// ## Parameters
///
/// - `default_sensitive`: names probed when a request names no sensitive
///   features
/// - `synthetic_*` / `seed`: deterministic synthesis shape and RNG seed
/// - `explain_sample_rows`: rows fed to attribution (cost control)
/// - `attribution_sample_rows`: raw attribution rows retained in the result
/// - `warn_*` / `recommend_*`: rule-engine thresholds
/// - `transparency_*`, `accountability_credit`, `safety_factor`, `weights`:
///   compliance-scorer constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Sensitive-attribute names probed when the request names none.
    pub default_sensitive: Vec<String>,
    /// Sensitive columns guaranteed present in synthetic data.
    pub synthetic_sensitive: Vec<String>,
    /// Synthetic dataset row count.
    pub synthetic_rows: usize,
    /// Synthetic numeric feature count (before sensitive columns).
    pub synthetic_features: usize,
    /// Seed for synthesis and the degraded random-partition fallback.
    pub seed: u64,
    /// Maximum rows fed to the explainability stage.
    pub explain_sample_rows: usize,
    /// Raw attribution rows retained for inspection.
    pub attribution_sample_rows: usize,
    /// Number of top features reported.
    pub top_feature_count: usize,
    /// Warning threshold: demographic parity above this fires.
    pub warn_demographic_parity: f64,
    /// Warning threshold: disparate impact below this fires.
    pub warn_disparate_impact: f64,
    /// Warning threshold: fairness score below this fires.
    pub warn_fairness_score: f64,
    /// Warning threshold: overall compliance below this fires.
    pub warn_overall: f64,
    /// Recommendation threshold: demographic parity above this fires.
    pub recommend_demographic_parity: f64,
    /// Recommendation threshold: overall compliance below this fires.
    pub recommend_overall: f64,
    /// Transparency sub-score when feature importance is present.
    pub transparency_present: f64,
    /// Transparency sub-score when feature importance is absent.
    pub transparency_absent: f64,
    /// Fixed accountability sub-score.
    pub accountability_credit: f64,
    /// Safety sub-score as a fraction of the fairness sub-score.
    pub safety_factor: f64,
    /// Compliance sub-score weights.
    pub weights: ComplianceWeights,
}

impl AuditPolicy {
    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Validate internal consistency.
    ///
    /// Weights must sum to 1.0 (within 1e-9) and thresholds must lie in
    /// [0, 1]. Call at construction boundaries (engine, service startup).
    pub fn validate(&self) -> Result<(), PolicyError> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(PolicyError::WeightsNotNormalized(sum));
        }
        let thresholds = [
            ("warn_demographic_parity", self.warn_demographic_parity),
            ("warn_disparate_impact", self.warn_disparate_impact),
            ("warn_fairness_score", self.warn_fairness_score),
            ("warn_overall", self.warn_overall),
            (
                "recommend_demographic_parity",
                self.recommend_demographic_parity,
            ),
            ("recommend_overall", self.recommend_overall),
            ("transparency_present", self.transparency_present),
            ("transparency_absent", self.transparency_absent),
            ("accountability_credit", self.accountability_credit),
            ("safety_factor", self.safety_factor),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::ThresholdOutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Compute a hash of the policy parameters.
    ///
    /// Uses quantized float representation to ensure cross-platform
    /// consistency. Floats are multiplied by 1e6 and rounded to i64 before
    /// hashing.
    pub fn params_hash(&self) -> String {
        let quantized = self.to_quantized();
        canonical_hash_hex(&quantized)
    }

    fn to_quantized(&self) -> QuantizedPolicyParams {
        QuantizedPolicyParams {
            version: self.version.clone(),
            default_sensitive: self.default_sensitive.clone(),
            synthetic_sensitive: self.synthetic_sensitive.clone(),
            synthetic_rows: self.synthetic_rows,
            synthetic_features: self.synthetic_features,
            seed: self.seed,
            explain_sample_rows: self.explain_sample_rows,
            attribution_sample_rows: self.attribution_sample_rows,
            top_feature_count: self.top_feature_count,
            warn_demographic_parity: quantize_float(self.warn_demographic_parity),
            warn_disparate_impact: quantize_float(self.warn_disparate_impact),
            warn_fairness_score: quantize_float(self.warn_fairness_score),
            warn_overall: quantize_float(self.warn_overall),
            recommend_demographic_parity: quantize_float(self.recommend_demographic_parity),
            recommend_overall: quantize_float(self.recommend_overall),
            transparency_present: quantize_float(self.transparency_present),
            transparency_absent: quantize_float(self.transparency_absent),
            accountability_credit: quantize_float(self.accountability_credit),
            safety_factor: quantize_float(self.safety_factor),
            weights: self.weights.to_quantized(),
        }
    }

    /// Create a minimal policy for testing (tiny synthesis, same rules).
    #[cfg(test)]
    pub fn minimal() -> Self {
        Self {
            synthetic_rows: 64,
            synthetic_features: 4,
            ..Self::default()
        }
    }
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            default_sensitive: vec![
                "gender".to_string(),
                "sex".to_string(),
                "race".to_string(),
                "age".to_string(),
                "ethnicity".to_string(),
            ],
            synthetic_sensitive: vec!["gender".to_string(), "age_group".to_string()],
            synthetic_rows: 1000,
            synthetic_features: 10,
            seed: 42,
            explain_sample_rows: 100,
            attribution_sample_rows: 10,
            top_feature_count: 5,
            warn_demographic_parity: 0.1,
            warn_disparate_impact: 0.8,
            warn_fairness_score: 0.7,
            warn_overall: 0.6,
            recommend_demographic_parity: 0.05,
            recommend_overall: 0.8,
            transparency_present: 0.8,
            transparency_absent: 0.3,
            accountability_credit: 0.9,
            safety_factor: 0.9,
            weights: ComplianceWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_validates() {
        AuditPolicy::default().validate().unwrap();
    }

    #[test]
    fn test_weights_must_normalize() {
        let mut policy = AuditPolicy::default();
        policy.weights.fairness = 0.5;
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::WeightsNotNormalized(_))
        ));
    }

    #[test]
    fn test_threshold_range_checked() {
        let mut policy = AuditPolicy::default();
        policy.warn_overall = 1.5;
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn test_params_hash_determinism() {
        let policy1 = AuditPolicy::default();
        let policy2 = AuditPolicy::default();

        assert_eq!(policy1.params_hash(), policy2.params_hash());
    }

    #[test]
    fn test_params_hash_changes() {
        let policy1 = AuditPolicy::default();
        let mut policy2 = AuditPolicy::default();
        policy2.warn_demographic_parity = 0.2; // Change a parameter

        assert_ne!(policy1.params_hash(), policy2.params_hash());
    }
}
