//! # model-audit-kernel
//!
//! Bias, fairness, and explainability auditing for trained binary classifiers.
//!
//! The audit kernel answers one question:
//!
//! > Given a serialized model and (optionally) labeled test data, how does the
//! > model behave across the two groups of a sensitive attribute, and what is
//! > its heuristic compliance posture?
//!
//! ## Core Contract
//!
//! 1. Load the model artifact through a closed set of format adapters
//! 2. Load or deterministically synthesize a labeled tabular dataset
//! 3. Compute bias, fairness, and attribution metrics per the audit type
//! 4. Aggregate into a compliance score plus ordered warnings/recommendations
//! 5. Stamp the result with provenance and an HMAC attestation
//!
//! ## Architecture
//!
//! ```text
//! AuditRequest → ModelAdapter ┐
//!                             ├→ Predictions → Bias / Fairness / Explainability
//!               DatasetSource ┘                        ↓
//!                                         ComplianceScorer → Advisor
//!                                                  ↓
//!                                     AuditResult + Attestation
//! ```
//!
//! ## Degradation Guarantees
//!
//! - A missing or unloadable model is fatal; nothing else is
//! - A failed metric defaults to a neutral value and appends a warning
//! - Degraded-mode caveats (synthetic data, random partition) are surfaced
//!   in the result's `notes`, never hidden
//! - Identical requests over identical inputs produce identical warnings,
//!   recommendations, and metric values (the synthesis and fallback RNGs
//!   are policy-seeded)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod model;
pub mod data;
pub mod metrics;
pub mod explain;
pub mod engine;
pub mod canonical;
pub mod store;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{AuditRequest, AuditType};
pub use types::dataset::{
    DataOrigin, Dataset, DatasetError, FeatureTable, PredictionSet, TableError,
};
pub use types::metrics::{
    BiasMetricSet, DisparateImpact, ExplainabilityResult, FairnessMetricSet, FeatureWeight,
};
pub use types::report::{AuditProvenance, AuditResult, AuditStatus, ComplianceScore};
pub use types::attestation::Attestation;
pub use types::verification::{AttestationVerifier, CacheConfig, CacheStats};
pub use policy::{AuditPolicy, ComplianceWeights, PolicyError};
pub use policy::compliance::{score_compliance, ComplianceInputs};
pub use policy::advisor::{generate_recommendations, generate_warnings, AdviceContext};
pub use model::{load_model, LoadedModel, ModelError, ModelFormat};
pub use data::{load_or_generate, DataOutcome};
pub use metrics::{GroupPartition, MetricError, PartitionSource};
pub use metrics::bias::{compute_bias_metrics, BiasOutcome};
pub use metrics::fairness::{
    compute_fairness_metrics, false_positive_rate, true_positive_rate, FairnessOutcome,
};
pub use explain::compute_explainability;
pub use engine::{AuditEngine, EngineError};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use store::{AuditRecord, AuditStore, InMemoryAuditStore, StoreError};
#[cfg(feature = "postgres")]
pub use store::PostgresAuditStore;

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, MetricsCatalog, ServiceState};

/// Schema version for all audit report types.
/// Increment on breaking changes to any schema type.
pub const AUDIT_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "audit_policy_v1";
