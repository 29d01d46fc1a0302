//! Canonical serialization for deterministic hashing.
//!
//! Policy params hashes, dataset fingerprints, and attestation digests are
//! all derived from canonical JSON bytes hashed with xxh64.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use BTreeMap for maps in hashed data
//! - Floats in hashed structs must be pre-quantized to integers

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// This function produces deterministic output for the same input,
/// suitable for hash computation and attestation verification.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
