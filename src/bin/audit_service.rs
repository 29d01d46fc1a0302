//! Model Audit Service Binary
//!
//! Runs the audit kernel as a REST API service with production-grade
//! features: structured JSON logging, request tracing, graceful shutdown,
//! and health check endpoints.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (optional; in-memory store when unset)
//! - `AUDIT_HMAC_SECRET`: HMAC secret for attestation signing (required in production)
//! - `PORT`: Service port (default: 8002)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! AUDIT_HMAC_SECRET=... cargo run --bin audit_service --features service
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use model_audit_kernel::service::{create_router, metrics_middleware, ServiceState};
use model_audit_kernel::store::AuditStore;
use model_audit_kernel::{InMemoryAuditStore, PostgresAuditStore};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "audit_service=info,tower_http=info,sqlx=warn".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

/// Request logging middleware that adds correlation ID and timing
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let trace_id = request
        .headers()
        .get("X-Cloud-Trace-Context")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split('/').next().unwrap_or(s).to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        trace_id = %trace_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "audit_service::access",
        trace_id = %trace_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

async fn build_store() -> Result<Arc<dyn AuditStore>, Box<dyn std::error::Error>> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => {
            info!("Connecting to PostgreSQL...");
            let connect_start = Instant::now();
            let store = tokio::time::timeout(
                std::time::Duration::from_secs(30),
                PostgresAuditStore::connect(&url),
            )
            .await
            .map_err(|_| "Database connection timeout after 30s")??;
            info!(
                latency_ms = connect_start.elapsed().as_millis() as u64,
                "PostgreSQL connection established"
            );
            Ok(Arc::new(store))
        }
        _ => {
            warn!("DATABASE_URL not set, using in-memory store. Reports will not survive restarts.");
            Ok(Arc::new(InMemoryAuditStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, "Starting Model Audit Service");

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8002);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    let store = build_store().await?;
    let state = ServiceState::from_env(store)?;

    info!(
        policy_id = state.engine.policy().policy_id(),
        policy_params_hash = %state.engine.policy().params_hash(),
        "Audit policy loaded"
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(address = %addr, version = version, "Model Audit Service listening");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
            _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
        }
    };

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Model Audit Service shutdown complete");

    Ok(())
}
