//! Property tests for scoring and rule-engine invariants.

use proptest::prelude::*;

use model_audit_kernel::{
    false_positive_rate, generate_recommendations, generate_warnings, score_compliance,
    true_positive_rate, AdviceContext, AuditPolicy, ComplianceInputs, DisparateImpact,
};

fn disparate_impact_strategy() -> impl Strategy<Value = DisparateImpact> {
    prop_oneof![
        (0.0..2.0f64).prop_map(DisparateImpact::Computed),
        Just(DisparateImpact::Failed),
        Just(DisparateImpact::NotEvaluated),
    ]
}

proptest! {
    #[test]
    fn compliance_scores_stay_in_unit_interval(
        has_importance in any::<bool>(),
        dp in proptest::option::of(0.0..1.5f64),
        di in disparate_impact_strategy(),
    ) {
        let policy = AuditPolicy::default();
        let score = score_compliance(
            &ComplianceInputs {
                has_feature_importance: has_importance,
                demographic_parity: dp,
                disparate_impact: di,
            },
            &policy,
        );

        for value in [
            score.transparency,
            score.accountability,
            score.fairness,
            score.safety,
            score.overall,
        ] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
        // Safety never exceeds fairness (it is a scaled-down proxy).
        prop_assert!(score.safety <= score.fairness + 1e-12);
    }

    #[test]
    fn compliance_is_monotone_in_demographic_parity(
        dp_low in 0.0..0.5f64,
        delta in 0.0..0.5f64,
    ) {
        let policy = AuditPolicy::default();
        let inputs = |dp| ComplianceInputs {
            has_feature_importance: true,
            demographic_parity: Some(dp),
            disparate_impact: DisparateImpact::Computed(1.0),
        };

        let low = score_compliance(&inputs(dp_low), &policy);
        let high = score_compliance(&inputs(dp_low + delta), &policy);
        prop_assert!(high.fairness <= low.fairness + 1e-12);
        prop_assert!(high.overall <= low.overall + 1e-12);
    }

    #[test]
    fn rates_stay_in_unit_interval(
        labels in proptest::collection::vec(0u8..=1, 1..200),
    ) {
        // Pair the labels with a shifted copy of themselves as predictions.
        let preds: Vec<u8> = labels.iter().rev().copied().collect();
        let tpr = true_positive_rate(&labels, &preds);
        let fpr = false_positive_rate(&labels, &preds);
        prop_assert!((0.0..=1.0).contains(&tpr));
        prop_assert!((0.0..=1.0).contains(&fpr));
    }

    #[test]
    fn perfect_predictions_have_perfect_rates(
        labels in proptest::collection::vec(0u8..=1, 1..200),
    ) {
        let tpr = true_positive_rate(&labels, &labels);
        let fpr = false_positive_rate(&labels, &labels);
        if labels.contains(&1) {
            prop_assert_eq!(tpr, 1.0);
        } else {
            prop_assert_eq!(tpr, 0.0);
        }
        prop_assert_eq!(fpr, 0.0);
    }

    #[test]
    fn advisor_is_deterministic_and_ordered(
        dp in proptest::option::of(0.0..1.0f64),
        di in disparate_impact_strategy(),
        fairness_score in 0.0..1.0f64,
        overall in 0.0..1.0f64,
        has_importance in any::<bool>(),
    ) {
        let policy = AuditPolicy::default();
        let ctx = AdviceContext {
            demographic_parity: dp,
            disparate_impact: di,
            fairness_score,
            overall_compliance: overall,
            has_feature_importance: has_importance,
        };

        let w1 = generate_warnings(&ctx, &policy);
        let w2 = generate_warnings(&ctx, &policy);
        prop_assert_eq!(&w1, &w2);

        let r1 = generate_recommendations(&ctx, &policy);
        let r2 = generate_recommendations(&ctx, &policy);
        prop_assert_eq!(&r1, &r2);

        // The standing re-audit recommendation is always present and last.
        prop_assert!(!r1.is_empty());
        prop_assert!(r1.last().unwrap().contains("re-audit"));

        // At most one instance of each warning rule.
        prop_assert!(w1.len() <= 4);
        let unique: std::collections::BTreeSet<_> = w1.iter().collect();
        prop_assert_eq!(unique.len(), w1.len());
    }

    #[test]
    fn clean_metrics_produce_no_warnings(
        dp in 0.0..0.1f64,
        di in 0.8..1.2f64,
        fairness_score in 0.7..1.0f64,
        overall in 0.6..1.0f64,
    ) {
        let policy = AuditPolicy::default();
        let ctx = AdviceContext {
            demographic_parity: Some(dp),
            disparate_impact: DisparateImpact::Computed(di),
            fairness_score,
            overall_compliance: overall,
            has_feature_importance: true,
        };
        // All values at or inside their thresholds: nothing fires.
        prop_assert!(generate_warnings(&ctx, &policy).is_empty());
    }

    #[test]
    fn policy_hash_is_stable_under_clone(
        warn_dp in 0.0..1.0f64,
        seed in any::<u64>(),
    ) {
        let mut policy = AuditPolicy::default();
        policy.warn_demographic_parity = warn_dp;
        policy.seed = seed;

        prop_assert_eq!(policy.params_hash(), policy.clone().params_hash());
    }
}
