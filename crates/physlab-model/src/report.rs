use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::AggregateMetrics;
use crate::baseline::BaselineComparison;
use crate::criteria::CriterionResult;

/// Bumped when the serialised report layout changes; baselines from another
/// schema are refused instead of being misread.
pub const REPORT_SCHEMA: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Passed,
    Failed,
    Error,
}

/// Terminal output of one run. Either structurally complete
/// (passed/failed) or minimally populated with an error message; in the
/// error case the aggregates are null, not absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    #[serde(default)]
    pub schema: u32,
    pub status: ReportStatus,
    pub experiment_name: String,
    pub total_steps: u64,
    pub total_time: f32,
    pub metrics: Option<AggregateMetrics>,
    #[serde(default)]
    pub criteria_results: BTreeMap<String, CriterionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub baseline_comparison: Option<BaselineComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub error: Option<String>,
}

impl SimulationReport {
    pub fn completed(
        experiment_name: String,
        total_steps: u64,
        total_time: f32,
        metrics: AggregateMetrics,
        criteria_results: BTreeMap<String, CriterionResult>,
        all_passed: bool,
    ) -> Self {
        Self {
            schema: REPORT_SCHEMA,
            status: if all_passed { ReportStatus::Passed } else { ReportStatus::Failed },
            experiment_name,
            total_steps,
            total_time,
            metrics: Some(metrics),
            criteria_results,
            baseline_comparison: None,
            error: None,
        }
    }

    pub fn errored(experiment_name: String, message: String) -> Self {
        Self {
            schema: REPORT_SCHEMA,
            status: ReportStatus::Error,
            experiment_name,
            total_steps: 0,
            total_time: 0.0,
            metrics: None,
            criteria_results: BTreeMap::new(),
            baseline_comparison: None,
            error: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&ReportStatus::Passed).unwrap(), "\"passed\"");
        assert_eq!(serde_json::to_string(&ReportStatus::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn error_report_has_null_metrics_not_absent() {
        let r = SimulationReport::errored("exp".into(), "solver blew up".into());
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"metrics\":null"));
        assert!(json.contains("solver blew up"));
        assert!(!json.contains("baseline_comparison"));
    }

    #[test]
    fn completed_report_round_trips() {
        let r = SimulationReport::completed(
            "exp".into(),
            60,
            1.0,
            AggregateMetrics::default(),
            BTreeMap::new(),
            true,
        );
        let json = serde_json::to_string_pretty(&r).unwrap();
        let back: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
        assert_eq!(back.status, ReportStatus::Passed);
    }
}
