//! Warning and recommendation rules.
//!
//! Stateless and deterministic: the same context always yields the same
//! ordered lists. Evaluation order is part of the observable contract —
//! tests assert exact ordering. No rule removes or supersedes another; all
//! qualifying conditions fire independently.

use crate::types::metrics::DisparateImpact;

use super::AuditPolicy;

/// Inputs to the rule engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdviceContext {
    /// Measured demographic parity, or `None` when the bias stage did not
    /// run (no warning fires on absence).
    pub demographic_parity: Option<f64>,
    /// Disparate-impact tri-state. `Failed` warns (the metric was expected
    /// and is missing); `NotEvaluated` does not.
    pub disparate_impact: DisparateImpact,
    /// Scalar fairness score.
    pub fairness_score: f64,
    /// Overall compliance score.
    pub overall_compliance: f64,
    /// Whether any feature importance was produced.
    pub has_feature_importance: bool,
}

/// Evaluate the warning rules in their fixed order.
pub fn generate_warnings(ctx: &AdviceContext, policy: &AuditPolicy) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(dp) = ctx.demographic_parity {
        if dp > policy.warn_demographic_parity {
            warnings.push(format!(
                "High demographic parity difference detected (>{})",
                policy.warn_demographic_parity
            ));
        }
    }

    let di_below_threshold = match ctx.disparate_impact {
        DisparateImpact::Computed(di) => di < policy.warn_disparate_impact,
        DisparateImpact::Failed => true,
        DisparateImpact::NotEvaluated => false,
    };
    if di_below_threshold {
        warnings.push(format!(
            "Disparate impact below {} threshold (potential discrimination)",
            policy.warn_disparate_impact
        ));
    }

    if ctx.fairness_score < policy.warn_fairness_score {
        warnings.push("Overall fairness score below acceptable threshold".to_string());
    }

    if ctx.overall_compliance < policy.warn_overall {
        warnings.push("Compliance score below recommended minimum".to_string());
    }

    warnings
}

/// Evaluate the recommendation rules in their fixed order.
///
/// The standing re-audit recommendation is appended unconditionally and is
/// always last.
pub fn generate_recommendations(ctx: &AdviceContext, policy: &AuditPolicy) -> Vec<String> {
    let mut recs = Vec::new();

    if let Some(dp) = ctx.demographic_parity {
        if dp > policy.recommend_demographic_parity {
            recs.push(
                "Consider rebalancing training data or applying bias mitigation techniques"
                    .to_string(),
            );
        }
    }

    if !ctx.has_feature_importance {
        recs.push(
            "Add model explainability documentation for better transparency".to_string(),
        );
    }

    if ctx.overall_compliance < policy.recommend_overall {
        recs.push("Review AI ethics guidelines and address compliance gaps".to_string());
    }

    recs.push("Regularly re-audit the model after retraining or data updates".to_string());

    recs
}
