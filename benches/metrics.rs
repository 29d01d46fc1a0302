//! Benchmarks for metric computation and attestation verification.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use model_audit_kernel::data::generate_synthetic;
use model_audit_kernel::types::dataset::PredictionSet;
use model_audit_kernel::{
    compute_bias_metrics, compute_fairness_metrics, Attestation, AttestationVerifier,
    AuditPolicy,
};

fn bench_synthesis(c: &mut Criterion) {
    let policy = AuditPolicy::default();
    c.bench_function("generate_synthetic_1000x12", |b| {
        b.iter(|| generate_synthetic(black_box(&policy)))
    });
}

fn bench_bias_metrics(c: &mut Criterion) {
    let policy = AuditPolicy::default();
    let dataset = generate_synthetic(&policy);
    // Predictions that disagree with the labels on every third row.
    let predictions = PredictionSet::new(
        dataset
            .labels
            .iter()
            .enumerate()
            .map(|(i, &y)| if i % 3 == 0 { 1 - y } else { y })
            .collect(),
    );

    c.bench_function("bias_metrics_1000_rows", |b| {
        b.iter(|| {
            compute_bias_metrics(
                black_box(&dataset),
                black_box(&predictions),
                black_box(&policy),
            )
            .unwrap()
        })
    });

    c.bench_function("fairness_metrics_1000_rows", |b| {
        b.iter(|| {
            compute_fairness_metrics(
                black_box(&dataset),
                black_box(&predictions),
                black_box(&policy),
            )
            .unwrap()
        })
    });
}

fn bench_verification(c: &mut Criterion) {
    let secret = b"bench_secret".to_vec();
    let attestation = Attestation::issue_hmac(
        &secret,
        "bench-audit",
        "audit_policy_v1",
        "params_hash",
        "dataset_fingerprint",
        0.85,
        "1.0.0",
    );

    c.bench_function("verify_uncached", |b| {
        b.iter(|| {
            // Fresh verifier each iteration forces the HMAC path.
            let verifier = AttestationVerifier::new(secret.clone());
            verifier.verify(black_box(&attestation))
        })
    });

    let cached = AttestationVerifier::new(secret.clone());
    cached.verify(&attestation);
    c.bench_function("verify_cached", |b| {
        b.iter(|| cached.verify(black_box(&attestation)))
    });
}

criterion_group!(benches, bench_synthesis, bench_bias_metrics, bench_verification);
criterion_main!(benches);
