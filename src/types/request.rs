//! Audit request types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which parts of the pipeline an audit runs.
///
/// This is a closed set: unknown values are rejected during deserialization
/// at the boundary, never inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditType {
    /// Bias metrics only.
    Bias,
    /// Fairness metrics only.
    Fairness,
    /// Explainability only.
    Explainability,
    /// All stages.
    Full,
}

impl AuditType {
    /// Parse an audit type from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bias" => Some(Self::Bias),
            "fairness" => Some(Self::Fairness),
            "explainability" => Some(Self::Explainability),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Whether the bias stage runs for this audit type.
    pub fn runs_bias(&self) -> bool {
        matches!(self, Self::Bias | Self::Full)
    }

    /// Whether the fairness stage runs for this audit type.
    pub fn runs_fairness(&self) -> bool {
        matches!(self, Self::Fairness | Self::Full)
    }

    /// Whether the explainability stage runs for this audit type.
    pub fn runs_explainability(&self) -> bool {
        matches!(self, Self::Explainability | Self::Full)
    }
}

impl Default for AuditType {
    fn default() -> Self {
        Self::Full
    }
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bias => write!(f, "bias"),
            Self::Fairness => write!(f, "fairness"),
            Self::Explainability => write!(f, "explainability"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// A request to audit a serialized model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRequest {
    /// Caller-assigned audit identifier. Generated if absent.
    #[serde(default)]
    pub audit_id: Option<String>,
    /// Path to the serialized model artifact.
    pub model_path: PathBuf,
    /// Which stages to run.
    #[serde(default)]
    pub audit_type: AuditType,
    /// Sensitive feature names to audit along. Falls back to the policy's
    /// default name list when absent.
    #[serde(default)]
    pub sensitive_features: Option<Vec<String>>,
    /// Optional labeled test dataset. A deterministic synthetic dataset is
    /// generated when absent or unreadable.
    #[serde(default)]
    pub test_data_path: Option<PathBuf>,
}

impl AuditRequest {
    /// Create a full-audit request for a model path.
    pub fn full(model_path: impl Into<PathBuf>) -> Self {
        Self {
            audit_id: None,
            model_path: model_path.into(),
            audit_type: AuditType::Full,
            sensitive_features: None,
            test_data_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_type_closed_set() {
        assert_eq!(AuditType::from_str("bias"), Some(AuditType::Bias));
        assert_eq!(AuditType::from_str("FULL"), Some(AuditType::Full));
        assert_eq!(AuditType::from_str("everything"), None);
    }

    #[test]
    fn test_audit_type_rejected_at_boundary() {
        let bad = serde_json::from_str::<AuditType>("\"robustness\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_stage_flags() {
        assert!(AuditType::Full.runs_bias());
        assert!(AuditType::Full.runs_fairness());
        assert!(AuditType::Full.runs_explainability());
        assert!(AuditType::Bias.runs_bias());
        assert!(!AuditType::Bias.runs_fairness());
        assert!(!AuditType::Explainability.runs_bias());
    }

    #[test]
    fn test_request_defaults() {
        let req: AuditRequest =
            serde_json::from_str(r#"{"model_path": "/tmp/model.est"}"#).unwrap();
        assert_eq!(req.audit_type, AuditType::Full);
        assert!(req.sensitive_features.is_none());
        assert!(req.test_data_path.is_none());
    }
}
