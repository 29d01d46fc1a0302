//! Core types for the audit kernel.

pub mod request;
pub mod dataset;
pub mod metrics;
pub mod report;
pub mod attestation;
pub mod verification;

pub use request::{AuditRequest, AuditType};
pub use dataset::{DataOrigin, Dataset, DatasetError, FeatureTable, PredictionSet, TableError};
pub use metrics::{
    BiasMetricSet, DisparateImpact, ExplainabilityResult, FairnessMetricSet, FeatureWeight,
};
pub use report::{AuditProvenance, AuditResult, AuditStatus, ComplianceScore};
pub use attestation::Attestation;
pub use verification::{AttestationVerifier, CacheConfig, CacheStats};
