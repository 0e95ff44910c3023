use serde::{Deserialize, Serialize};

use physlab_core::types::Vec3;
use crate::descriptor::Transform;

/// A contact deeper than this counts as a constraint violation.
pub const PEN_WARN: f32 = 1.0e-3;

/// Everything measured after one solver step. Never mutated after emission;
/// owns all of its data so frames can outlive the world that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFrame {
    pub step: u64,
    pub time: f32,
    pub energy: EnergyMetrics,
    pub momentum: MomentumMetrics,
    pub contacts: ContactMetrics,
    #[serde(default)]
    pub bodies: Vec<BodyState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyMetrics {
    pub kinetic: f32,
    pub potential: f32,
    pub total: f32,
}

impl EnergyMetrics {
    pub fn new(kinetic: f32, potential: f32) -> Self {
        Self { kinetic, potential, total: kinetic + potential }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MomentumMetrics {
    pub linear: Vec3,
    pub angular: Vec3,
    pub linear_magnitude: f32,
    pub angular_magnitude: f32,
}

impl MomentumMetrics {
    pub fn new(linear: Vec3, angular: Vec3) -> Self {
        Self {
            linear,
            angular,
            linear_magnitude: linear.length(),
            angular_magnitude: angular.length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactMetrics {
    pub contact_count: u32,
    pub max_penetration: f32,
    pub total_penetration: f32,
    pub constraint_violations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub id: u32,
    pub name: String,
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub sleeping: bool,
}
