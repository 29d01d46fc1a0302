//! Service middleware for metrics and request tracking.
//!
//! ## Metrics Exposed
//!
//! - `audit_kernel_requests_total` - Counter of requests by path, method, status
//! - `audit_kernel_audits_total` - Counter of completed audits by status
//! - `audit_kernel_verifications_total` - Counter of attestation verifications

use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

use crate::types::report::AuditResult;

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing for now - can be upgraded to prometheus metrics later.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "audit_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces UUIDs (generated audit ids) with an `:id` placeholder.
fn normalize_path(path: &str) -> String {
    static UUID_REGEX: OnceLock<regex_lite::Regex> = OnceLock::new();
    let uuid_regex = UUID_REGEX.get_or_init(|| {
        regex_lite::Regex::new(
            r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        )
        .expect("static pattern")
    });

    uuid_regex.replace_all(path, ":id").to_string()
}

/// Record audit pipeline metrics after a run.
pub fn record_audit_metrics(result: &AuditResult) {
    info!(
        target: "audit_kernel::metrics",
        metric_type = "audit",
        audit_type = %result.audit_type,
        status = ?result.status,
        overall = result.compliance.overall,
        warnings = result.warnings.len(),
        "audit_metric"
    );
}

/// Record attestation verification metrics.
pub fn record_verification(valid: bool) {
    let result = if valid { "valid" } else { "invalid" };
    info!(
        target: "audit_kernel::metrics",
        metric_type = "verification",
        result = result,
        "verification_metric"
    );
}
