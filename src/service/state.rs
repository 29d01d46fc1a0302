//! Shared service state.

use std::sync::Arc;

use crate::engine::{AuditEngine, EngineError};
use crate::policy::AuditPolicy;
use crate::store::AuditStore;
use crate::types::verification::AttestationVerifier;

/// Shared state behind every route handler.
///
/// The engine signs with the HMAC secret; the verifier holds the same
/// secret so `/api/verify` answers without re-deriving it.
pub struct ServiceState {
    /// The audit engine (policy fixed at startup).
    pub engine: Arc<AuditEngine>,
    /// Report persistence backend.
    pub store: Arc<dyn AuditStore>,
    /// Cached attestation verifier.
    pub verifier: Arc<AttestationVerifier>,
}

impl ServiceState {
    /// Create service state over a validated policy and a store backend.
    pub fn new(
        policy: AuditPolicy,
        store: Arc<dyn AuditStore>,
        hmac_secret: Vec<u8>,
    ) -> Result<Self, EngineError> {
        let engine = AuditEngine::new(policy)?.with_signing_secret(hmac_secret.clone());
        Ok(Self {
            engine: Arc::new(engine),
            store,
            verifier: Arc::new(AttestationVerifier::new(hmac_secret)),
        })
    }

    /// Create service state from environment variables.
    ///
    /// Reads `AUDIT_HMAC_SECRET`; falls back to a development secret when
    /// unset.
    pub fn from_env(store: Arc<dyn AuditStore>) -> Result<Self, EngineError> {
        let hmac_secret = std::env::var("AUDIT_HMAC_SECRET")
            .map(|s| s.into_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "AUDIT_HMAC_SECRET not set, using development secret. \
                     Set this for production!"
                );
                b"development_only_secret_not_for_production".to_vec()
            });

        Self::new(AuditPolicy::default(), store, hmac_secret)
    }
}

impl Clone for ServiceState {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            store: Arc::clone(&self.store),
            verifier: Arc::clone(&self.verifier),
        }
    }
}
