//! Axum routes for the Model Audit service.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::EngineError;
use crate::store::AuditRecord;
use crate::types::attestation::Attestation;
use crate::types::report::{AuditResult, AuditStatus};
use crate::types::request::{AuditRequest, AuditType};
use crate::types::verification::CacheStats;
use crate::AUDIT_SCHEMA_VERSION;

use super::middleware::{record_audit_metrics, record_verification};
use super::state::ServiceState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the audit listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    /// Maximum number of reports to return.
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    50
}

/// One row of the audit listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Audit identifier.
    pub audit_id: String,
    /// Which stages were requested.
    pub audit_type: AuditType,
    /// Completion status.
    pub status: AuditStatus,
    /// Overall compliance score.
    pub overall_compliance: f64,
    /// Number of warnings on the report.
    pub warning_count: usize,
    /// When the report was stored.
    pub stored_at: DateTime<Utc>,
}

impl From<&AuditRecord> for AuditSummary {
    fn from(record: &AuditRecord) -> Self {
        Self {
            audit_id: record.result.audit_id.clone(),
            audit_type: record.result.audit_type,
            status: record.result.status,
            overall_compliance: record.result.compliance.overall,
            warning_count: record.result.warnings.len(),
            stored_at: record.stored_at,
        }
    }
}

/// Audit listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditListResponse {
    /// Most recent reports, newest first.
    pub audits: Vec<AuditSummary>,
    /// Number of rows returned.
    pub count: usize,
}

/// Request to verify an audit attestation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// The attestation exactly as it appeared on a report.
    pub attestation: Attestation,
}

/// Response from attestation verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the attestation is valid.
    pub valid: bool,
    /// Reason if invalid.
    pub reason: Option<String>,
}

/// Capability catalog: what this kernel version computes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsCatalog {
    /// Bias metric keys.
    pub bias_metrics: Vec<String>,
    /// Fairness metric keys.
    pub fairness_metrics: Vec<String>,
    /// Attribution methods by model format.
    pub explainability_methods: Vec<String>,
    /// Compliance sub-score keys.
    pub compliance_dimensions: Vec<String>,
    /// Accepted audit types.
    pub audit_types: Vec<String>,
}

impl Default for MetricsCatalog {
    fn default() -> Self {
        Self {
            bias_metrics: vec![
                "demographic_parity".to_string(),
                "equalized_odds".to_string(),
                "disparate_impact".to_string(),
            ],
            fairness_metrics: vec![
                "statistical_parity_difference".to_string(),
                "equal_opportunity_difference".to_string(),
                "average_odds_difference".to_string(),
            ],
            explainability_methods: vec![
                "tree_path_attribution".to_string(),
                "linear_occlusion".to_string(),
            ],
            compliance_dimensions: vec![
                "transparency".to_string(),
                "accountability".to_string(),
                "fairness".to_string(),
                "safety".to_string(),
                "overall".to_string(),
            ],
            audit_types: vec![
                "bias".to_string(),
                "fairness".to_string(),
                "explainability".to_string(),
                "full".to_string(),
            ],
        }
    }
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    pub policy_id: String,
    pub policy_params_hash: String,
    /// Verification cache counters.
    pub verification_cache: CacheStats,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing (matches X-Cloud-Trace-Context or generated UUID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            code = %self.code,
            error = %self.error,
            correlation_id = ?self.correlation_id,
            "Request error"
        );
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn engine_error_response(e: EngineError) -> HandlerError {
    match e {
        EngineError::MissingModel(path) => (
            StatusCode::NOT_FOUND,
            Json(
                ErrorResponse::new("MODEL_NOT_FOUND", "Model file not found")
                    .with_details(path.display().to_string()),
            ),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("AUDIT_FAILED", other.to_string())),
        ),
    }
}

/// Run an audit over a model artifact.
///
/// The pipeline is CPU-bound and synchronous, so it runs on the blocking
/// pool. Persistence is best-effort: a store failure is logged but the
/// computed report is still returned.
async fn audit_handler(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<AuditRequest>,
) -> Result<Json<AuditResult>, HandlerError> {
    let engine = Arc::clone(&state.engine);
    let result = tokio::task::spawn_blocking(move || engine.run(&request))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("AUDIT_PANICKED", e.to_string())),
            )
        })?
        .map_err(engine_error_response)?;

    record_audit_metrics(&result);

    if let Err(e) = state.store.put(AuditRecord::new(result.clone())).await {
        tracing::warn!(audit_id = %result.audit_id, error = %e, "failed to persist audit report");
    }

    Ok(Json(result))
}

/// List recently stored audit reports.
async fn list_audits_handler(
    State(state): State<Arc<ServiceState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AuditListResponse>, HandlerError> {
    let records = state.store.list_recent(query.limit).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("STORE_FAILED", e.to_string())),
        )
    })?;

    let audits: Vec<AuditSummary> = records.iter().map(AuditSummary::from).collect();
    Ok(Json(AuditListResponse {
        count: audits.len(),
        audits,
    }))
}

/// Fetch one stored audit report.
async fn get_audit_handler(
    State(state): State<Arc<ServiceState>>,
    Path(audit_id): Path<String>,
) -> Result<Json<AuditRecord>, HandlerError> {
    let record = state
        .store
        .get(&audit_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("STORE_FAILED", e.to_string())),
            )
        })?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(
                    ErrorResponse::new("AUDIT_NOT_FOUND", "No report with that audit id")
                        .with_details(audit_id.clone()),
                ),
            )
        })?;

    Ok(Json(record))
}

/// Verify an audit attestation.
///
/// Downstream services can call this to check a report's attestation
/// without holding the HMAC secret.
async fn verify_handler(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let valid = state.verifier.verify(&request.attestation);
    record_verification(valid);

    Json(VerifyResponse {
        valid,
        reason: if valid {
            None
        } else {
            Some("Attestation does not match expected HMAC".to_string())
        },
    })
}

/// Capability catalog.
async fn metrics_catalog_handler() -> Json<MetricsCatalog> {
    Json(MetricsCatalog::default())
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<Arc<ServiceState>>) -> Json<HealthResponse> {
    let policy = state.engine.policy();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: AUDIT_SCHEMA_VERSION.to_string(),
        policy_id: policy.policy_id().to_string(),
        policy_params_hash: policy.params_hash(),
        verification_cache: state.verifier.stats(),
    })
}

/// Liveness probe endpoint. Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the Model Audit service.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Audit operations
        .route("/api/audit", post(audit_handler))
        .route("/api/audits", get(list_audits_handler))
        .route("/api/audits/:id", get(get_audit_handler))
        // Attestation verification
        .route("/api/verify", post(verify_handler))
        // Capability catalog
        .route("/api/metrics", get(metrics_catalog_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .with_state(state)
}
