use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateMetrics;
use crate::error::{HarnessError, Result};
use crate::report::{SimulationReport, REPORT_SCHEMA};

// A metric must move by more than 1% of the baseline magnitude (floored at
// ABS_TOL for near-zero baselines) before it counts as improved or regressed.
const REL_TOL: f64 = 0.01;
const ABS_TOL: f64 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Accept,
    Reject,
    Review,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub baseline_name: String,
    pub metrics_improved: Vec<String>,
    pub metrics_regressed: Vec<String>,
    pub recommendation: Recommendation,
}

/// Refuse baselines we cannot read correctly. Runs before any simulation.
pub fn check_compatible(baseline: &SimulationReport) -> Result<()> {
    if baseline.schema != REPORT_SCHEMA {
        return Err(HarnessError::BaselineIncompatible {
            reason: format!("schema {} does not match expected {REPORT_SCHEMA}", baseline.schema),
        });
    }
    if baseline.metrics.is_none() {
        return Err(HarnessError::BaselineIncompatible {
            reason: "baseline report carries no aggregate metrics".into(),
        });
    }
    Ok(())
}

// Scores are oriented so that lower is always better.
fn scored(m: &AggregateMetrics) -> [(&'static str, f64); 3] {
    [
        ("energy_drift_percent", m.energy_drift_percent.abs()),
        ("max_penetration_ever", m.max_penetration_ever as f64),
        ("total_constraint_violations", m.total_constraint_violations as f64),
    ]
}

/// Diff current aggregates against a compatible baseline and recommend.
/// `average_contact_count` is informational only and never scored.
pub fn compare_to_baseline(
    current: &AggregateMetrics,
    current_passed: bool,
    baseline_name: &str,
    baseline: &AggregateMetrics,
) -> BaselineComparison {
    let mut metrics_improved = Vec::new();
    let mut metrics_regressed = Vec::new();

    for ((tag, cur), (_, base)) in scored(current).into_iter().zip(scored(baseline)) {
        let tol = (REL_TOL * base.abs()).max(ABS_TOL);
        if cur < base - tol {
            metrics_improved.push(tag.to_string());
        } else if cur > base + tol {
            metrics_regressed.push(tag.to_string());
        }
    }

    let recommendation = if !current_passed {
        Recommendation::Reject
    } else if metrics_regressed.is_empty() {
        Recommendation::Accept
    } else if metrics_improved.is_empty() {
        Recommendation::Reject
    } else {
        Recommendation::Review
    };

    BaselineComparison {
        baseline_name: baseline_name.to_string(),
        metrics_improved,
        metrics_regressed,
        recommendation,
    }
}
