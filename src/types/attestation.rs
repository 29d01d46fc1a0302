//! HMAC-signed audit attestations.
//!
//! An attestation is cryptographic proof that a result was produced by an
//! engine holding the signing secret, binding the audit id, the policy that
//! governed it, the dataset it ran over, and the overall score. Downstream
//! consumers verify attestations instead of trusting report JSON at face
//! value.

use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Quantization factor applied to the overall score before signing.
/// Matches the policy-hash quantization so signatures are platform-stable.
const SCORE_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// HMAC-SHA256 attestation over an audit result's provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Hex-encoded HMAC-SHA256 tag.
    pub token: String,
    /// Audit identifier the token binds.
    pub audit_id: String,
    /// Policy version identifier.
    pub policy_id: String,
    /// Canonical hash of the quantized policy parameters.
    pub policy_params_hash: String,
    /// Canonical hash of the evaluation dataset.
    pub dataset_fingerprint: String,
    /// Overall compliance score, quantized to 1e-6.
    pub overall_quantized: i64,
    /// Report schema version.
    pub schema_version: String,
}

impl Attestation {
    /// Domain-separation tag baked into every signed message.
    pub const ATTESTATION_VERSION: &'static str = "audit_attestation_v1_hmac";

    /// Issue a signed attestation (kernel-only operation).
    ///
    /// The signing secret must never leave the engine; downstream services
    /// verify through [`crate::AttestationVerifier`].
    #[allow(clippy::too_many_arguments)]
    pub fn issue_hmac(
        secret: &[u8],
        audit_id: &str,
        policy_id: &str,
        policy_params_hash: &str,
        dataset_fingerprint: &str,
        overall_score: f64,
        schema_version: &str,
    ) -> Self {
        use hmac::{Hmac, Mac};

        let overall_quantized = quantize_score(overall_score);
        let message = Self::message(
            audit_id,
            policy_id,
            policy_params_hash,
            dataset_fingerprint,
            overall_quantized,
            schema_version,
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(secret)
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        let token = hex::encode(mac.finalize().into_bytes());

        Self {
            token,
            audit_id: audit_id.to_string(),
            policy_id: policy_id.to_string(),
            policy_params_hash: policy_params_hash.to_string(),
            dataset_fingerprint: dataset_fingerprint.to_string(),
            overall_quantized,
            schema_version: schema_version.to_string(),
        }
    }

    /// Verify the token against a secret in constant time.
    pub fn verify_hmac(&self, secret: &[u8]) -> bool {
        use hmac::{Hmac, Mac};

        let message = Self::message(
            &self.audit_id,
            &self.policy_id,
            &self.policy_params_hash,
            &self.dataset_fingerprint,
            self.overall_quantized,
            &self.schema_version,
        );

        let Ok(expected) = hex::decode(&self.token) else {
            return false;
        };

        let mut mac = Hmac::<Sha256>::new_from_slice(secret)
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    fn message(
        audit_id: &str,
        policy_id: &str,
        policy_params_hash: &str,
        dataset_fingerprint: &str,
        overall_quantized: i64,
        schema_version: &str,
    ) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            Self::ATTESTATION_VERSION,
            audit_id,
            policy_id,
            policy_params_hash,
            dataset_fingerprint,
            overall_quantized,
            schema_version,
        )
    }
}

fn quantize_score(score: f64) -> i64 {
    (score * SCORE_QUANTIZATION_FACTOR).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_for_attestation_tests";

    fn issue() -> Attestation {
        Attestation::issue_hmac(
            SECRET,
            "audit-1",
            "audit_policy_v1",
            "abc123",
            "def456",
            0.8125,
            "1.0.0",
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let att = issue();
        assert!(att.verify_hmac(SECRET));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let att = issue();
        assert!(!att.verify_hmac(b"wrong_secret"));
    }

    #[test]
    fn test_tampered_field_rejected() {
        let mut att = issue();
        att.audit_id = "audit-2".to_string();
        assert!(!att.verify_hmac(SECRET));
    }

    #[test]
    fn test_tampered_score_rejected() {
        let mut att = issue();
        att.overall_quantized += 1;
        assert!(!att.verify_hmac(SECRET));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let mut att = issue();
        att.token = "not-hex".to_string();
        assert!(!att.verify_hmac(SECRET));
    }

    #[test]
    fn test_issue_is_deterministic() {
        assert_eq!(issue(), issue());
    }
}
