use serde::{Deserialize, Serialize};

use crate::metrics::MetricFrame;

/// Kinetic energy must stay below STAB_KE joules for STAB_WINDOW consecutive
/// frames before a run counts as stabilised.
pub const STAB_WINDOW: usize = 30;
pub const STAB_KE: f32 = 0.1;

// Drift denominator floor, so near-zero initial energy does not blow up.
const DRIFT_EPS: f64 = 1.0e-6;

/// Whole-run rollup of a frame sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub initial_energy: f32,
    pub final_energy: f32,
    pub energy_drift_percent: f64,
    pub max_penetration_ever: f32,
    pub total_constraint_violations: u64,
    pub average_contact_count: f64,
    pub stabilization_step: Option<u64>,
    pub stability_time: Option<f32>,
    pub frame_count: u64,
}

impl AggregateMetrics {
    /// Frames must be in emission order; `frames[i].step == i` is assumed.
    pub fn compute(frames: &[MetricFrame]) -> Self {
        if frames.is_empty() {
            return Self::default();
        }

        let initial_energy = frames[0].energy.total;
        let final_energy = frames[frames.len() - 1].energy.total;
        let denom = (initial_energy.abs() as f64).max(DRIFT_EPS);
        let energy_drift_percent = (final_energy as f64 - initial_energy as f64) / denom * 100.0;

        let max_penetration_ever = frames
            .iter()
            .map(|f| f.contacts.max_penetration)
            .fold(0.0f32, f32::max);

        let total_constraint_violations = frames
            .iter()
            .map(|f| f.contacts.constraint_violations as u64)
            .sum();

        let total_contacts: u64 = frames.iter().map(|f| f.contacts.contact_count as u64).sum();
        let average_contact_count = total_contacts as f64 / frames.len() as f64;

        let stabilization_step = detect_stabilization(frames);
        let stability_time = stabilization_step.map(|k| frames[k as usize].time);

        Self {
            initial_energy,
            final_energy,
            energy_drift_percent,
            max_penetration_ever,
            total_constraint_violations,
            average_contact_count,
            stabilization_step,
            stability_time,
            frame_count: frames.len() as u64,
        }
    }
}

/// Smallest k such that kinetic energy stays below STAB_KE over
/// [k, k + STAB_WINDOW). None when no window fits.
fn detect_stabilization(frames: &[MetricFrame]) -> Option<u64> {
    if frames.len() < STAB_WINDOW {
        return None;
    }
    let mut run = 0usize;
    for (i, f) in frames.iter().enumerate() {
        if f.energy.kinetic < STAB_KE {
            run += 1;
            if run == STAB_WINDOW {
                return Some((i + 1 - STAB_WINDOW) as u64);
            }
        } else {
            run = 0;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{EnergyMetrics, MomentumMetrics, ContactMetrics};
    use approx::assert_relative_eq;

    fn frame(step: u64, kinetic: f32, potential: f32) -> MetricFrame {
        MetricFrame {
            step,
            time: step as f32 / 60.0,
            energy: EnergyMetrics::new(kinetic, potential),
            momentum: MomentumMetrics::default(),
            contacts: ContactMetrics::default(),
            bodies: vec![],
        }
    }

    fn frames_with_kinetic(kinetics: &[f32]) -> Vec<MetricFrame> {
        kinetics.iter().enumerate().map(|(i, &k)| frame(i as u64, k, 0.0)).collect()
    }

    #[test]
    fn empty_sequence_yields_defaults() {
        let agg = AggregateMetrics::compute(&[]);
        assert_eq!(agg.frame_count, 0);
        assert_eq!(agg.stabilization_step, None);
    }

    #[test]
    fn drift_is_signed_percentage() {
        let frames = vec![frame(0, 100.0, 0.0), frame(1, 98.0, 0.0)];
        let agg = AggregateMetrics::compute(&frames);
        assert_relative_eq!(agg.energy_drift_percent, -2.0, epsilon = 1e-4);
    }

    #[test]
    fn near_zero_initial_energy_uses_floor() {
        let frames = vec![frame(0, 0.0, 0.0), frame(1, 1.0e-3, 0.0)];
        let agg = AggregateMetrics::compute(&frames);
        // denominator floored at 1e-6, numerator 1e-3
        assert!(agg.energy_drift_percent > 0.0);
        assert!(agg.energy_drift_percent.is_finite());
    }

    #[test]
    fn penetration_and_violations_accumulate() {
        let mut frames = frames_with_kinetic(&[1.0, 1.0, 1.0]);
        frames[1].contacts = ContactMetrics {
            contact_count: 4,
            max_penetration: 0.004,
            total_penetration: 0.006,
            constraint_violations: 2,
        };
        frames[2].contacts = ContactMetrics {
            contact_count: 2,
            max_penetration: 0.001,
            total_penetration: 0.001,
            constraint_violations: 1,
        };
        let agg = AggregateMetrics::compute(&frames);
        assert_relative_eq!(agg.max_penetration_ever, 0.004);
        assert_eq!(agg.total_constraint_violations, 3);
        assert_relative_eq!(agg.average_contact_count, 2.0);
    }

    #[test]
    fn stabilization_finds_first_quiet_window() {
        // 10 loud frames, then quiet for the rest
        let mut kin = vec![5.0; 10];
        kin.extend(std::iter::repeat(0.01).take(40));
        let agg = AggregateMetrics::compute(&frames_with_kinetic(&kin));
        assert_eq!(agg.stabilization_step, Some(10));
        assert_relative_eq!(agg.stability_time.unwrap(), 10.0 / 60.0, epsilon = 1e-6);
    }

    #[test]
    fn interrupted_quiet_window_does_not_stabilise() {
        // quiet runs of 29 broken by a spike, repeatedly
        let mut kin = Vec::new();
        for _ in 0..3 {
            kin.extend(std::iter::repeat(0.01).take(29));
            kin.push(5.0);
        }
        let agg = AggregateMetrics::compute(&frames_with_kinetic(&kin));
        assert_eq!(agg.stabilization_step, None);
    }

    #[test]
    fn too_short_sequence_never_stabilises() {
        let agg = AggregateMetrics::compute(&frames_with_kinetic(&[0.0; 29]));
        assert_eq!(agg.stabilization_step, None);
    }

    #[test]
    fn quiet_from_start_stabilises_at_zero() {
        let agg = AggregateMetrics::compute(&frames_with_kinetic(&[0.01; 30]));
        assert_eq!(agg.stabilization_step, Some(0));
        assert_relative_eq!(agg.stability_time.unwrap(), 0.0);
    }
}
