//! Audit orchestration.
//!
//! The engine owns the policy and the optional signing secret, and runs the
//! pipeline stages in a fixed order: model load, data resolution,
//! prediction, bias, fairness, explainability, compliance, advice.
//!
//! ## Failure discipline
//!
//! Only the model boundary is fatal: a missing, unsupported, or invalid
//! artifact returns an error and no result. A prediction failure returns a
//! `Partial` result carrying whatever provenance exists. Every later stage
//! defaults its metrics and appends a warning instead of failing the audit,
//! so a degraded result always has the same shape as a clean one.

use serde::Serialize;
use std::path::PathBuf;

use crate::canonical::canonical_hash_hex;
use crate::data::load_or_generate;
use crate::explain::compute_explainability;
use crate::metrics::bias::compute_bias_metrics;
use crate::metrics::fairness::compute_fairness_metrics;
use crate::model::{load_model, ModelError};
use crate::policy::advisor::{generate_recommendations, generate_warnings, AdviceContext};
use crate::policy::compliance::{score_compliance, ComplianceInputs};
use crate::policy::{AuditPolicy, PolicyError};
use crate::types::dataset::Dataset;
use crate::types::metrics::{
    BiasMetricSet, DisparateImpact, ExplainabilityResult, FairnessMetricSet,
};
use crate::types::report::{AuditProvenance, AuditResult, AuditStatus, ComplianceScore};
use crate::types::request::AuditRequest;
use crate::types::attestation::Attestation;
use crate::AUDIT_SCHEMA_VERSION;

/// Error type for audit orchestration.
///
/// Everything here is a request-level failure; pipeline degradation is
/// reported inside the result instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The policy failed validation at construction.
    #[error("Invalid audit policy: {0}")]
    Policy(#[from] PolicyError),
    /// The model artifact does not exist.
    #[error("Model file not found: {0}")]
    MissingModel(PathBuf),
    /// The artifact matched no supported format.
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),
    /// The artifact matched a format but failed validation.
    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),
}

/// The audit pipeline.
///
/// One engine may serve many audits; it holds no per-audit state.
pub struct AuditEngine {
    policy: AuditPolicy,
    policy_params_hash: String,
    signing_secret: Option<Vec<u8>>,
}

impl AuditEngine {
    /// Create an engine over a validated policy.
    pub fn new(policy: AuditPolicy) -> Result<Self, EngineError> {
        policy.validate()?;
        let policy_params_hash = policy.params_hash();
        Ok(Self {
            policy,
            policy_params_hash,
            signing_secret: None,
        })
    }

    /// Attach an HMAC signing secret; completed results will carry an
    /// attestation.
    pub fn with_signing_secret(mut self, secret: Vec<u8>) -> Self {
        self.signing_secret = Some(secret);
        self
    }

    /// The engine's policy.
    pub fn policy(&self) -> &AuditPolicy {
        &self.policy
    }

    /// Run one audit.
    pub fn run(&self, request: &AuditRequest) -> Result<AuditResult, EngineError> {
        let audit_id = request
            .audit_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        tracing::info!(
            audit_id,
            audit_type = %request.audit_type,
            model_path = %request.model_path.display(),
            "audit started"
        );

        let model = load_model(&request.model_path).map_err(|e| match e {
            ModelError::MissingFile(p) => EngineError::MissingModel(p),
            ModelError::UnsupportedFormat(p) => EngineError::UnsupportedFormat(p),
            other => EngineError::InvalidModel(other.to_string()),
        })?;

        let data = load_or_generate(
            request.test_data_path.as_deref(),
            request.sensitive_features.as_deref(),
            &self.policy,
        );
        let mut notes = data.notes;
        let dataset = data.dataset;
        let dataset_fingerprint = fingerprint(&dataset);

        let predictions = match model.predict(&dataset.features) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(audit_id, error = %e, "prediction failed, returning partial result");
                return Ok(self.partial_result(
                    audit_id,
                    request,
                    &dataset,
                    dataset_fingerprint,
                    notes,
                    format!("Partial audit: model prediction failed ({e})"),
                ));
            }
        };

        let mut stage_warnings = Vec::new();

        // Bias stage. Demographic parity stays `None` (pessimistic for
        // compliance) both when the stage is skipped and when it failed.
        let mut bias_metrics = BiasMetricSet::default();
        let mut disparate_impact = DisparateImpact::NotEvaluated;
        let mut demographic_parity = None;
        if request.audit_type.runs_bias() {
            match compute_bias_metrics(&dataset, &predictions, &self.policy) {
                Ok(outcome) => {
                    bias_metrics = outcome.metrics;
                    disparate_impact = outcome.disparate_impact;
                    demographic_parity = Some(outcome.metrics.demographic_parity);
                    notes.extend(outcome.notes);
                }
                Err(e) => {
                    tracing::warn!(audit_id, error = %e, "bias stage failed");
                    disparate_impact = DisparateImpact::Failed;
                    stage_warnings
                        .push("Bias metric computation failed; values defaulted".to_string());
                }
            }
        }

        // Fairness stage.
        let mut fairness_metrics = FairnessMetricSet::default();
        if request.audit_type.runs_fairness() {
            match compute_fairness_metrics(&dataset, &predictions, &self.policy) {
                Ok(outcome) => {
                    fairness_metrics = outcome.metrics;
                    notes.extend(outcome.notes);
                }
                Err(e) => {
                    tracing::warn!(audit_id, error = %e, "fairness stage failed");
                    stage_warnings
                        .push("Fairness metric computation failed; values defaulted".to_string());
                }
            }
        }

        // Explainability stage.
        let mut explainability = ExplainabilityResult::empty();
        if request.audit_type.runs_explainability() {
            match compute_explainability(&model, &dataset, &self.policy) {
                Ok(result) => explainability = result,
                Err(e) => {
                    tracing::warn!(audit_id, error = %e, "explainability stage failed");
                    stage_warnings.push(
                        "Explainability analysis failed; no feature importance produced"
                            .to_string(),
                    );
                }
            }
        }

        // Scalars stay at 0.0 for dimensions the audit type never measured;
        // an unmeasured dimension must not read as a perfect score.
        let bias_score = if request.audit_type.runs_bias() {
            bias_score(&bias_metrics, disparate_impact)
        } else {
            0.0
        };
        let fairness_score = if request.audit_type.runs_fairness() {
            fairness_score(&fairness_metrics)
        } else {
            0.0
        };

        let compliance = score_compliance(
            &ComplianceInputs {
                has_feature_importance: explainability.has_feature_importance(),
                demographic_parity,
                disparate_impact,
            },
            &self.policy,
        );

        let ctx = AdviceContext {
            demographic_parity,
            disparate_impact,
            fairness_score,
            overall_compliance: compliance.overall,
            has_feature_importance: explainability.has_feature_importance(),
        };
        let mut warnings = generate_warnings(&ctx, &self.policy);
        warnings.extend(stage_warnings);
        let recommendations = generate_recommendations(&ctx, &self.policy);

        let attestation = self.signing_secret.as_ref().map(|secret| {
            Attestation::issue_hmac(
                secret,
                &audit_id,
                self.policy.policy_id(),
                &self.policy_params_hash,
                &dataset_fingerprint,
                compliance.overall,
                AUDIT_SCHEMA_VERSION,
            )
        });

        tracing::info!(
            audit_id,
            overall = compliance.overall,
            warnings = warnings.len(),
            "audit completed"
        );

        Ok(AuditResult {
            audit_id,
            audit_type: request.audit_type,
            status: AuditStatus::Completed,
            bias_score,
            fairness_score,
            bias_metrics,
            fairness_metrics,
            explainability,
            compliance,
            warnings,
            recommendations,
            notes,
            provenance: self.provenance(dataset_fingerprint, &dataset),
            attestation,
        })
    }

    /// Shape-stable result for a pipeline abort. Unattested by definition.
    fn partial_result(
        &self,
        audit_id: String,
        request: &AuditRequest,
        dataset: &Dataset,
        dataset_fingerprint: String,
        notes: Vec<String>,
        warning: String,
    ) -> AuditResult {
        AuditResult {
            audit_id,
            audit_type: request.audit_type,
            status: AuditStatus::Partial,
            bias_score: 0.0,
            fairness_score: 0.0,
            bias_metrics: BiasMetricSet::default(),
            fairness_metrics: FairnessMetricSet::default(),
            explainability: ExplainabilityResult::empty(),
            compliance: ComplianceScore::default(),
            warnings: vec![warning],
            recommendations: Vec::new(),
            notes,
            provenance: self.provenance(dataset_fingerprint, dataset),
            attestation: None,
        }
    }

    fn provenance(&self, dataset_fingerprint: String, dataset: &Dataset) -> AuditProvenance {
        AuditProvenance {
            policy_id: self.policy.policy_id().to_string(),
            policy_params_hash: self.policy_params_hash.clone(),
            dataset_fingerprint,
            data_origin: dataset.origin,
            schema_version: AUDIT_SCHEMA_VERSION.to_string(),
            completed_at: chrono::Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct FingerprintView<'a> {
    columns: &'a [String],
    rows: &'a [Vec<f64>],
    labels: &'a [u8],
    sensitive: &'a [String],
}

/// Content hash of the evaluation dataset.
fn fingerprint(dataset: &Dataset) -> String {
    canonical_hash_hex(&FingerprintView {
        columns: dataset.features.columns(),
        rows: dataset.features.rows(),
        labels: &dataset.labels,
        sensitive: &dataset.sensitive_columns,
    })
}

/// `1 − (dp + eo)/2 − |1 − di|·0.5`, clipped to [0, 1].
///
/// A failed disparate-impact computation penalizes as if di were 0.0; a
/// deliberately skipped one contributes no penalty. The compliance scorer,
/// not this scalar, is where plain absence is penalized.
fn bias_score(metrics: &BiasMetricSet, disparate_impact: DisparateImpact) -> f64 {
    let di_penalty = match disparate_impact {
        DisparateImpact::Computed(di) => (1.0 - di).abs() * 0.5,
        DisparateImpact::Failed => 0.5,
        DisparateImpact::NotEvaluated => 0.0,
    };
    let score =
        1.0 - (metrics.demographic_parity + metrics.equalized_odds) / 2.0 - di_penalty;
    score.clamp(0.0, 1.0)
}

/// `1 − mean(spd, eod, aod)`, clipped to [0, 1].
fn fairness_score(metrics: &FairnessMetricSet) -> f64 {
    let mean = (metrics.statistical_parity_difference
        + metrics.equal_opportunity_difference
        + metrics.average_odds_difference)
        / 3.0;
    (1.0 - mean).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::request::AuditType;
    use std::io::Write;
    use std::path::Path;

    fn engine() -> AuditEngine {
        AuditEngine::new(AuditPolicy::minimal()).unwrap()
    }

    fn write_model(dir: &Path, name: &str, json: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(json.as_bytes()).unwrap();
        path
    }

    /// Linear model over the minimal policy's synthetic width (4 features
    /// plus 2 sensitive columns).
    fn synthetic_width_model(dir: &Path) -> PathBuf {
        write_model(
            dir,
            "model.est",
            r#"{"kind": "linear",
                "model": {"weights": [1.0, 1.0, 0.0, 0.0, 0.0, 0.0], "bias": 0.0}}"#,
        )
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let request = AuditRequest::full("/nonexistent/model.est");
        assert!(matches!(
            engine().run(&request).unwrap_err(),
            EngineError::MissingModel(_)
        ));
    }

    #[test]
    fn test_full_audit_over_synthetic_data() {
        let dir = tempfile::tempdir().unwrap();
        let request = AuditRequest::full(synthetic_width_model(dir.path()));

        let result = engine().run(&request).unwrap();
        assert_eq!(result.status, AuditStatus::Completed);
        assert!(result.explainability.has_feature_importance());
        assert!(result.notes.iter().any(|n| n.contains("not provided")));
        assert!((0.0..=1.0).contains(&result.compliance.overall));
        assert!((0.0..=1.0).contains(&result.bias_score));
        assert!((0.0..=1.0).contains(&result.fairness_score));
        // Standing recommendation always present.
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn test_repeat_runs_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = AuditRequest::full(synthetic_width_model(dir.path()));
        request.audit_id = Some("fixed-id".to_string());

        let a = engine().run(&request).unwrap();
        let b = engine().run(&request).unwrap();
        assert_eq!(a.bias_metrics, b.bias_metrics);
        assert_eq!(a.fairness_metrics, b.fairness_metrics);
        assert_eq!(a.compliance, b.compliance);
        assert_eq!(a.warnings, b.warnings);
        assert_eq!(a.recommendations, b.recommendations);
        assert_eq!(a.provenance.dataset_fingerprint, b.provenance.dataset_fingerprint);
    }

    #[test]
    fn test_bias_only_audit_skips_other_stages() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = AuditRequest::full(synthetic_width_model(dir.path()));
        request.audit_type = AuditType::Bias;

        let result = engine().run(&request).unwrap();
        assert_eq!(result.fairness_metrics, FairnessMetricSet::default());
        assert!(!result.explainability.has_feature_importance());
        // Absent explainability fires the documentation recommendation.
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("explainability documentation")));
    }

    #[test]
    fn test_explainability_only_audit_leaves_di_unevaluated() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = AuditRequest::full(synthetic_width_model(dir.path()));
        request.audit_type = AuditType::Explainability;

        let result = engine().run(&request).unwrap();
        assert_eq!(result.bias_metrics, BiasMetricSet::default());
        // NotEvaluated must not fire the disparate-impact warning.
        assert!(!result
            .warnings
            .iter()
            .any(|w| w.contains("Disparate impact")));
    }

    #[test]
    fn test_prediction_failure_yields_partial_result() {
        let dir = tempfile::tempdir().unwrap();
        // Model width disagrees with the synthetic table.
        let path = write_model(
            dir.path(),
            "narrow.est",
            r#"{"kind": "linear", "model": {"weights": [1.0], "bias": 0.0}}"#,
        );
        let request = AuditRequest::full(path);

        let result = engine().run(&request).unwrap();
        assert_eq!(result.status, AuditStatus::Partial);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Partial audit"));
        assert!(result.attestation.is_none());
        assert!(!result.provenance.dataset_fingerprint.is_empty());
    }

    #[test]
    fn test_attestation_issued_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let request = AuditRequest::full(synthetic_width_model(dir.path()));
        let secret = b"engine_test_secret".to_vec();
        let engine = AuditEngine::new(AuditPolicy::minimal())
            .unwrap()
            .with_signing_secret(secret.clone());

        let result = engine.run(&request).unwrap();
        let att = result.attestation.expect("completed audit is attested");
        assert!(att.verify_hmac(&secret));
        assert_eq!(att.audit_id, result.audit_id);
        assert_eq!(att.dataset_fingerprint, result.provenance.dataset_fingerprint);
    }

    #[test]
    fn test_caller_file_used_when_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let model = write_model(
            dir.path(),
            "model.est",
            r#"{"kind": "linear", "model": {"weights": [1.0, 0.0], "bias": 0.0}}"#,
        );
        let data = dir.path().join("data.csv");
        let mut f = std::fs::File::create(&data).unwrap();
        f.write_all(b"income,gender,label\n1.0,0,1\n-1.0,1,0\n2.0,0,1\n-2.0,1,0\n")
            .unwrap();

        let mut request = AuditRequest::full(model);
        request.test_data_path = Some(data);

        let result = engine().run(&request).unwrap();
        assert_eq!(
            result.provenance.data_origin,
            crate::types::dataset::DataOrigin::File
        );
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut policy = AuditPolicy::default();
        policy.weights.fairness = 0.9;
        assert!(matches!(
            AuditEngine::new(policy),
            Err(EngineError::Policy(_))
        ));
    }
}
