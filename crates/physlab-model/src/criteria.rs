use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::AggregateMetrics;
use crate::error::{HarnessError, Result};
use crate::spec::CriterionSpec;

/// The closed set of aggregates criteria may reference. String tags on the
/// wire resolve to this enum once, before any step runs, so a typo fails the
/// run instead of being silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKey {
    InitialEnergy,
    FinalEnergy,
    EnergyDriftPercent,
    MaxPenetrationEver,
    TotalConstraintViolations,
    AverageContactCount,
    StabilizationStep,
    StabilityTime,
    FrameCount,
}

impl AggregateKey {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "initial_energy" => Self::InitialEnergy,
            "final_energy" => Self::FinalEnergy,
            "energy_drift_percent" => Self::EnergyDriftPercent,
            "max_penetration_ever" => Self::MaxPenetrationEver,
            "total_constraint_violations" => Self::TotalConstraintViolations,
            "average_contact_count" => Self::AverageContactCount,
            "stabilization_step" => Self::StabilizationStep,
            "stability_time" => Self::StabilityTime,
            "frame_count" => Self::FrameCount,
            _ => return None,
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::InitialEnergy => "initial_energy",
            Self::FinalEnergy => "final_energy",
            Self::EnergyDriftPercent => "energy_drift_percent",
            Self::MaxPenetrationEver => "max_penetration_ever",
            Self::TotalConstraintViolations => "total_constraint_violations",
            Self::AverageContactCount => "average_contact_count",
            Self::StabilizationStep => "stabilization_step",
            Self::StabilityTime => "stability_time",
            Self::FrameCount => "frame_count",
        }
    }

    /// None for the stability pair when the run never stabilised.
    pub fn value(&self, m: &AggregateMetrics) -> Option<f64> {
        Some(match self {
            Self::InitialEnergy => m.initial_energy as f64,
            Self::FinalEnergy => m.final_energy as f64,
            Self::EnergyDriftPercent => m.energy_drift_percent,
            Self::MaxPenetrationEver => m.max_penetration_ever as f64,
            Self::TotalConstraintViolations => m.total_constraint_violations as f64,
            Self::AverageContactCount => m.average_contact_count,
            Self::StabilizationStep => return m.stabilization_step.map(|s| s as f64),
            Self::StabilityTime => return m.stability_time.map(|t| t as f64),
            Self::FrameCount => m.frame_count as f64,
        })
    }
}

/// Outcome of one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    /// Null when the referenced aggregate itself is null.
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub passed: bool,
}

/// Resolve every criterion tag up front. Must run before stepping begins.
pub fn resolve_criteria(
    criteria: &BTreeMap<String, CriterionSpec>,
) -> Result<Vec<(String, AggregateKey, CriterionSpec)>> {
    let mut resolved = Vec::with_capacity(criteria.len());
    for (tag, spec) in criteria {
        let key = AggregateKey::from_tag(tag)
            .ok_or_else(|| HarnessError::UnknownCriterion { tag: tag.clone() })?;
        resolved.push((tag.clone(), key, *spec));
    }
    Ok(resolved)
}

/// Apply the resolved criteria. Returns per-criterion results and whether the
/// run passed overall. An empty criteria set always passes.
pub fn evaluate_criteria(
    metrics: &AggregateMetrics,
    resolved: &[(String, AggregateKey, CriterionSpec)],
) -> (BTreeMap<String, CriterionResult>, bool) {
    let mut results = BTreeMap::new();
    let mut all_passed = true;

    for (tag, key, spec) in resolved {
        let value = key.value(metrics);
        let passed = match value {
            Some(v) => {
                spec.min.map_or(true, |min| v >= min) && spec.max.map_or(true, |max| v <= max)
            }
            // an absent aggregate cannot satisfy a bound on it
            None => false,
        };
        if !passed {
            all_passed = false;
        }
        results.insert(tag.clone(), CriterionResult { value, min: spec.min, max: spec.max, passed });
    }

    (results, all_passed)
}
