//! Audit report types.
//!
//! ## Production Invariants
//!
//! 1. **Shape stability**: a degraded audit has the same structural shape as
//!    a clean one — callers must inspect `warnings` to tell them apart
//! 2. **Provenance completeness**: every result carries
//!    `(policy_id, policy_params_hash, dataset_fingerprint, schema_version)`
//! 3. **Non-escalation**: a missing `attestation` means unattested by
//!    definition

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attestation::Attestation;
use super::dataset::DataOrigin;
use super::metrics::{BiasMetricSet, ExplainabilityResult, FairnessMetricSet};
use super::request::AuditType;

/// Heuristic compliance sub-scores and their weighted aggregate.
///
/// All five values are clipped to [0, 1]. The overall score is a weighted
/// composite, not a certification.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplianceScore {
    /// Explainability-presence proxy (0.8 present, 0.3 absent).
    pub transparency: f64,
    /// Fixed audit-existence credit.
    pub accountability: f64,
    /// Composite of demographic-parity and disparate-impact transforms.
    pub fairness: f64,
    /// Fairness-derived proxy; no independent safety signal exists.
    pub safety: f64,
    /// Weighted sum of the four sub-scores (weights sum to 1.0).
    pub overall: f64,
}

/// Whether the pipeline ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    /// All requested stages ran (possibly with defaulted metrics).
    Completed,
    /// The pipeline aborted mid-flight and returned what it had.
    Partial,
}

/// Provenance block stamped on every audit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditProvenance {
    /// Policy version identifier.
    pub policy_id: String,
    /// Canonical hash of the quantized policy parameters.
    pub policy_params_hash: String,
    /// Canonical hash of the evaluation dataset shape and labels.
    pub dataset_fingerprint: String,
    /// Whether the data was loaded or synthesized.
    pub data_origin: DataOrigin,
    /// Report schema version.
    pub schema_version: String,
    /// Completion timestamp.
    pub completed_at: DateTime<Utc>,
}

/// Aggregate output of one audit invocation.
///
/// Immutable once computed; nothing in it persists across invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResult {
    /// Audit identifier (caller-assigned or generated).
    pub audit_id: String,
    /// Which stages were requested.
    pub audit_type: AuditType,
    /// Completion status. Degraded-but-finished audits are `completed`;
    /// inspect `warnings` to distinguish clean from degraded.
    pub status: AuditStatus,
    /// Scalar bias score in [0, 1]; higher is less biased.
    pub bias_score: f64,
    /// Scalar fairness score in [0, 1]; higher is fairer.
    pub fairness_score: f64,
    /// Group-disparity statistics.
    pub bias_metrics: BiasMetricSet,
    /// Parity/opportunity statistics.
    pub fairness_metrics: FairnessMetricSet,
    /// Feature-attribution output.
    pub explainability: ExplainabilityResult,
    /// Compliance sub-scores and overall.
    pub compliance: ComplianceScore,
    /// Ordered warnings: threshold rules first (fixed order), then
    /// stage-failure warnings in pipeline order.
    pub warnings: Vec<String>,
    /// Ordered recommendations; the standing re-audit recommendation is
    /// always last.
    pub recommendations: Vec<String>,
    /// Ordered degraded-mode caveats (synthetic data, random partition,
    /// parse fallback). Kept separate from `warnings` so threshold-rule
    /// semantics stay testable.
    pub notes: Vec<String>,
    /// Provenance block.
    pub provenance: AuditProvenance,
    /// HMAC attestation over the provenance and overall score, when the
    /// engine was constructed with a signing secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation: Option<Attestation>,
}
