use tracing::{debug, info, warn};

use physlab_model::{
    check_compatible, compare_to_baseline, evaluate_criteria, resolve_criteria, AggregateMetrics,
    ExperimentSpec, HarnessError, MetricFrame, Result, SimulationReport,
};

use crate::world::EmbeddedMetricWorld;

/// Run one experiment to completion against the embedded solver.
///
/// Spec problems, unknown criteria, and incompatible baselines surface as
/// errors before any step executes. A solver failure mid-run yields an
/// `Ok` report with `status = error`; criteria failures are ordinary
/// `status = failed` outcomes.
pub fn run(spec: &ExperimentSpec, baseline: Option<&SimulationReport>) -> Result<SimulationReport> {
    run_collect(spec, baseline).map(|(report, _frames)| report)
}

/// Same pipeline as [`run`], also handing back the per-step frames for
/// interactive or streaming consumers.
pub fn run_collect(
    spec: &ExperimentSpec,
    baseline: Option<&SimulationReport>,
) -> Result<(SimulationReport, Vec<MetricFrame>)> {
    spec.validate()?;
    let resolved = resolve_criteria(&spec.spec.criteria)?;
    let baseline_parts = match baseline {
        Some(b) => {
            check_compatible(b)?;
            b.metrics.as_ref().map(|m| (b.experiment_name.clone(), m.clone()))
        }
        None => None,
    };

    let name = spec.metadata.name.clone();
    let mut world = EmbeddedMetricWorld::new(spec)?;
    let target = world.target_steps();

    info!(experiment = %name, steps = target, "starting run");

    let mut frames: Vec<MetricFrame> = Vec::with_capacity(target as usize);
    while !world.is_complete() {
        match world.step() {
            Ok(frame) => frames.push(frame),
            Err(HarnessError::SolverError { message }) => {
                warn!(experiment = %name, %message, "solver failed mid-run");
                return Ok((SimulationReport::errored(name, message), frames));
            }
            Err(other) => return Err(other),
        }
    }

    let metrics = AggregateMetrics::compute(&frames);
    let (criteria_results, all_passed) = evaluate_criteria(&metrics, &resolved);
    debug!(
        experiment = %name,
        drift = metrics.energy_drift_percent,
        max_penetration = metrics.max_penetration_ever,
        passed = all_passed,
        "aggregated"
    );

    let comparison = baseline_parts
        .map(|(base_name, base)| compare_to_baseline(&metrics, all_passed, &base_name, &base));

    let total_time = frames.last().map(|f| f.time).unwrap_or(0.0);
    let mut report = SimulationReport::completed(
        name,
        frames.len() as u64,
        total_time,
        metrics,
        criteria_results,
        all_passed,
    );
    report.baseline_comparison = comparison;

    Ok((report, frames))
}
