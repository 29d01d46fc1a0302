//! Attestation verification with caching.
//!
//! Downstream services verify attestations repeatedly (every report read),
//! so verification results are memoized in a bounded LRU keyed by token.
//! The cache stores only verification outcomes, never the secret.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::attestation::Attestation;

/// Configuration for the verification cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of memoized verification outcomes.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Hit/miss counters for the verification cache.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Verifications answered from cache.
    pub hits: u64,
    /// Verifications that required an HMAC computation.
    pub misses: u64,
}

/// Verifies audit attestations against the kernel secret.
///
/// Thread-safe; one instance may be shared across request handlers.
pub struct AttestationVerifier {
    secret: Vec<u8>,
    cache: Mutex<LruCache<String, bool>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AttestationVerifier {
    /// Create a verifier with the default cache capacity.
    pub fn new(secret: Vec<u8>) -> Self {
        Self::with_config(secret, CacheConfig::default())
    }

    /// Create a verifier with an explicit cache configuration.
    pub fn with_config(secret: Vec<u8>, config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity.max(1))
            .expect("capacity clamped to at least 1");
        Self {
            secret,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Verify an attestation, consulting the cache first.
    ///
    /// The cache key covers the token and every bound field, so a copy
    /// with a tampered field never hits the entry memoized for the
    /// untampered original.
    pub fn verify(&self, attestation: &Attestation) -> bool {
        let key = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            attestation.token,
            attestation.audit_id,
            attestation.policy_id,
            attestation.policy_params_hash,
            attestation.dataset_fingerprint,
            attestation.overall_quantized,
            attestation.schema_version,
        );

        if let Some(valid) = self.cache.lock().get(&key).copied() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return valid;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let valid = attestation.verify_hmac(&self.secret);
        self.cache.lock().put(key, valid);
        valid
    }

    /// Current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
