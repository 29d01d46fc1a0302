//! Compliance scoring.
//!
//! A pure aggregation over already-sanitized stage outputs: no I/O, no
//! failure mode. The inputs carry explicit absence information so the
//! scorer never has to guess whether a zero was measured or defaulted.

use crate::types::metrics::DisparateImpact;
use crate::types::report::ComplianceScore;

use super::AuditPolicy;

/// Sanitized inputs to the compliance scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplianceInputs {
    /// Whether the explainability stage produced any feature importance.
    pub has_feature_importance: bool,
    /// Measured demographic parity, or `None` when the bias stage did not
    /// run. Absence scores pessimistically (treated as maximal disparity).
    pub demographic_parity: Option<f64>,
    /// Disparate-impact tri-state from the bias stage.
    pub disparate_impact: DisparateImpact,
}

/// Compute the four compliance sub-scores and their weighted overall.
///
/// - `transparency`: presence proxy — `transparency_present` when any
///   feature importance exists, else `transparency_absent`
/// - `accountability`: fixed credit for the audit having run at all
/// - `fairness`: mean of a demographic-parity transform
///   (`max(0, 1 − dp·2)`) and a disparate-impact transform
///   (`1 − |1 − di|` when measured, 0.5 neutral when not)
/// - `safety`: `fairness × safety_factor` (no independent safety signal)
/// - `overall`: weighted sum; weights sum to 1.0, so the result stays in
///   [0, 1] for sub-scores in [0, 1]
///
/// All outputs clip to [0, 1].
pub fn score_compliance(inputs: &ComplianceInputs, policy: &AuditPolicy) -> ComplianceScore {
    let transparency = if inputs.has_feature_importance {
        policy.transparency_present
    } else {
        policy.transparency_absent
    };

    let accountability = policy.accountability_credit;

    // Absent demographic parity is treated as maximal disparity so an audit
    // that never measured bias cannot score well on fairness.
    let dp = inputs.demographic_parity.unwrap_or(1.0);
    let fairness_from_dp = (1.0 - dp * 2.0).max(0.0);

    let fairness_from_di = match inputs.disparate_impact {
        DisparateImpact::Computed(di) => 1.0 - (1.0 - di).abs(),
        DisparateImpact::Failed | DisparateImpact::NotEvaluated => 0.5,
    };

    let fairness = (fairness_from_dp + fairness_from_di) / 2.0;
    let safety = fairness * policy.safety_factor;

    let weights = &policy.weights;
    let overall = transparency * weights.transparency
        + accountability * weights.accountability
        + fairness * weights.fairness
        + safety * weights.safety;

    ComplianceScore {
        transparency: clip(transparency),
        accountability: clip(accountability),
        fairness: clip(fairness),
        safety: clip(safety),
        overall: clip(overall),
    }
}

fn clip(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
