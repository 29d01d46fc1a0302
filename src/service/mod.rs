//! Model Audit REST Service
//!
//! Exposes the audit kernel as a REST API.
//!
//! ## Endpoints
//!
//! - `POST /api/audit` - Run an audit over a model artifact
//! - `GET /api/audits` - List recently stored audit reports
//! - `GET /api/audits/:id` - Fetch a stored audit report
//! - `POST /api/verify` - Verify an audit attestation
//! - `GET /api/metrics` - Capability catalog (metrics the kernel computes)
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_audit_metrics, record_verification};
pub use routes::{create_router, MetricsCatalog};
pub use state::ServiceState;
