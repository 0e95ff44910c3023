use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use physlab_core::types::Vec3;
use crate::error::{HarnessError, Result};
use crate::descriptor::Transform;

pub const API_VERSION: &str = "simuforge/v1";

/// Root experiment document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSpec {
    pub api_version: String,
    pub kind: String,
    pub metadata: ExperimentMetadata,
    pub spec: ExperimentConfig,
}

impl ExperimentSpec {
    /// Structural validation. Fails on the first offending field; runs before
    /// any solver state exists.
    pub fn validate(&self) -> Result<()> {
        if self.api_version != API_VERSION {
            return Err(HarnessError::spec_invalid(
                "apiVersion",
                format!("expected {API_VERSION}, got {}", self.api_version),
            ));
        }
        if self.kind != "Experiment" {
            return Err(HarnessError::spec_invalid("kind", format!("expected Experiment, got {}", self.kind)));
        }
        if self.metadata.name.is_empty() {
            return Err(HarnessError::spec_invalid("metadata.name", "must not be empty"));
        }
        self.spec.physics.validate()?;
        self.spec.duration.validate(self.spec.physics.timestep)?;
        self.spec.scenario.validate()?;
        self.spec.metrics.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub duration: DurationConfig,
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub criteria: BTreeMap<String, CriterionSpec>,
}

/* ---------------- physics ---------------- */

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PhysicsConfig {
    #[serde(default = "default_timestep")]
    pub timestep: f32,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    #[serde(default = "default_solver_iterations")]
    pub solver_iterations: u32,
    #[serde(default = "default_enhanced_determinism")]
    pub enhanced_determinism: bool,
    #[serde(default)]
    pub seed: u64,
}

fn default_timestep() -> f32 { 1.0 / 60.0 }
fn default_gravity() -> Vec3 { Vec3::new(0.0, -9.81, 0.0) }
fn default_solver_iterations() -> u32 { 8 }
fn default_enhanced_determinism() -> bool { true }

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            gravity: default_gravity(),
            solver_iterations: default_solver_iterations(),
            enhanced_determinism: default_enhanced_determinism(),
            seed: 0,
        }
    }
}

impl PhysicsConfig {
    fn validate(&self) -> Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(HarnessError::spec_invalid("physics.timestep", "must be a positive finite number"));
        }
        if !self.gravity.is_finite() {
            return Err(HarnessError::spec_invalid("physics.gravity", "components must be finite"));
        }
        if self.solver_iterations == 0 {
            return Err(HarnessError::spec_invalid("physics.solver_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

/* ---------------- duration ---------------- */

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DurationConfig {
    Fixed { steps: u64 },
    Time { seconds: f32 },
}

impl Default for DurationConfig {
    fn default() -> Self { Self::Fixed { steps: 600 } }
}

impl DurationConfig {
    fn validate(&self, timestep: f32) -> Result<()> {
        match *self {
            Self::Fixed { steps } => {
                if steps == 0 {
                    return Err(HarnessError::spec_invalid("duration.steps", "must be at least 1"));
                }
            }
            Self::Time { seconds } => {
                if !seconds.is_finite() || seconds <= 0.0 {
                    return Err(HarnessError::spec_invalid("duration.seconds", "must be a positive finite number"));
                }
                if timestep > 0.0 && (seconds / timestep) > 1.0e9 {
                    return Err(HarnessError::spec_invalid("duration.seconds", "materialises to an unreasonable step count"));
                }
            }
        }
        Ok(())
    }

    /// Resolve to a fixed step count; everything downstream runs bounded.
    pub fn target_steps(&self, timestep: f32) -> u64 {
        match *self {
            Self::Fixed { steps } => steps,
            Self::Time { seconds } => (seconds / timestep).ceil().max(1.0) as u64,
        }
    }
}

/* ---------------- scenario ---------------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioConfig {
    Builtin {
        name: String,
        #[serde(default)]
        params: BTreeMap<String, serde_yaml::Value>,
    },
    Custom {
        bodies: Vec<BodySpec>,
    },
}

impl ScenarioConfig {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Builtin { name, .. } => {
                if name.is_empty() {
                    return Err(HarnessError::spec_invalid("scenario.name", "must not be empty"));
                }
            }
            Self::Custom { bodies } => {
                if bodies.is_empty() {
                    return Err(HarnessError::spec_invalid("scenario.bodies", "must list at least one body"));
                }
                for (i, b) in bodies.iter().enumerate() {
                    b.validate(i)?;
                }
            }
        }
        Ok(())
    }
}

/// One body of a custom scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySpec {
    pub name: String,
    pub shape: ShapeSpec,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default)]
    pub angular_velocity: Vec3,
    #[serde(default)]
    pub kind: BodyKind,
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default = "default_restitution")]
    pub restitution: f32,
}

fn default_mass() -> f32 { 1.0 }
fn default_friction() -> f32 { 0.5 }
fn default_restitution() -> f32 { 0.1 }

impl BodySpec {
    fn validate(&self, index: usize) -> Result<()> {
        let field = |f: &str| format!("scenario.bodies[{index}].{f}");
        if self.name.is_empty() {
            return Err(HarnessError::spec_invalid(field("name"), "must not be empty"));
        }
        if self.kind == BodyKind::Dynamic && (!self.mass.is_finite() || self.mass <= 0.0) {
            return Err(HarnessError::spec_invalid(field("mass"), "dynamic bodies need positive finite mass"));
        }
        self.shape.validate(&field("shape"))?;
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(HarnessError::spec_invalid(field("friction"), "must be a non-negative finite number"));
        }
        if !self.restitution.is_finite() || self.restitution < 0.0 {
            return Err(HarnessError::spec_invalid(field("restitution"), "must be a non-negative finite number"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    #[default]
    Dynamic,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    Capsule { half_height: f32, radius: f32 },
    Cylinder { half_height: f32, radius: f32 },
}

impl ShapeSpec {
    fn validate(&self, field: &str) -> Result<()> {
        let ok = match *self {
            ShapeSpec::Box { half_extents } => {
                half_extents.is_finite() && half_extents.min_element() > 0.0
            }
            ShapeSpec::Sphere { radius } => radius.is_finite() && radius > 0.0,
            ShapeSpec::Capsule { half_height, radius }
            | ShapeSpec::Cylinder { half_height, radius } => {
                half_height.is_finite() && half_height > 0.0 && radius.is_finite() && radius > 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(HarnessError::spec_invalid(field, "dimensions must be positive finite numbers"))
        }
    }
}

/* ---------------- metrics & criteria ---------------- */

pub const PER_FRAME_TAGS: &[&str] = &["energy", "momentum", "contacts", "bodies"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub per_frame: Vec<String>,
    #[serde(default)]
    pub aggregate: Vec<String>,
}

impl MetricsConfig {
    fn validate(&self) -> Result<()> {
        for tag in &self.per_frame {
            if !PER_FRAME_TAGS.contains(&tag.as_str()) {
                return Err(HarnessError::spec_invalid("metrics.per_frame", format!("unknown tag `{tag}`")));
            }
        }
        for tag in &self.aggregate {
            if crate::criteria::AggregateKey::from_tag(tag).is_none() {
                return Err(HarnessError::spec_invalid("metrics.aggregate", format!("unknown tag `{tag}`")));
            }
        }
        Ok(())
    }

    /// Body states are the one per-frame section that costs real memory; an
    /// explicit tag list that omits `bodies` switches them off.
    pub fn collect_bodies(&self) -> bool {
        self.per_frame.is_empty() || self.per_frame.iter().any(|t| t == "bodies")
    }
}

/// Threshold bounds for one aggregate tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct CriterionSpec {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
apiVersion: simuforge/v1
kind: Experiment
metadata:
  name: smoke
spec:
  physics:
    timestep: 0.016666667
    gravity: [0, -9.81, 0]
  duration:
    type: fixed
    steps: 60
  scenario:
    type: builtin
    name: box_stack
    params:
      count: 3
"#
    }

    #[test]
    fn parses_and_validates_minimal_document() {
        let spec: ExperimentSpec = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert_eq!(spec.metadata.name, "smoke");
        assert!(spec.validate().is_ok());
        assert_eq!(spec.spec.duration.target_steps(spec.spec.physics.timestep), 60);
    }

    #[test]
    fn rejects_bad_timestep() {
        let mut spec: ExperimentSpec = serde_yaml::from_str(minimal_yaml()).unwrap();
        spec.spec.physics.timestep = 0.0;
        match spec.validate() {
            Err(HarnessError::SpecInvalid { field, .. }) => assert_eq!(field, "physics.timestep"),
            other => panic!("expected SpecInvalid, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_name_and_wrong_version() {
        let mut spec: ExperimentSpec = serde_yaml::from_str(minimal_yaml()).unwrap();
        spec.metadata.name.clear();
        assert!(matches!(spec.validate(), Err(HarnessError::SpecInvalid { .. })));

        let mut spec: ExperimentSpec = serde_yaml::from_str(minimal_yaml()).unwrap();
        spec.api_version = "simuforge/v2".into();
        assert!(matches!(spec.validate(), Err(HarnessError::SpecInvalid { .. })));
    }

    #[test]
    fn time_duration_materialises_to_steps() {
        let d = DurationConfig::Time { seconds: 1.0 };
        assert_eq!(d.target_steps(1.0 / 60.0), 60);
        let d = DurationConfig::Time { seconds: 0.001 };
        assert_eq!(d.target_steps(1.0 / 60.0), 1);
    }

    #[test]
    fn custom_scenario_round_trips() {
        let yaml = r#"
type: custom
bodies:
  - name: ball
    shape:
      type: sphere
      radius: 0.5
    transform:
      position: [0, 3, 0]
    mass: 2.0
"#;
        let sc: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(sc.validate().is_ok());
        match sc {
            ScenarioConfig::Custom { bodies } => {
                assert_eq!(bodies.len(), 1);
                assert_eq!(bodies[0].mass, 2.0);
                assert_eq!(bodies[0].kind, BodyKind::Dynamic);
            }
            _ => panic!("expected custom scenario"),
        }
    }

    #[test]
    fn unknown_metric_tag_is_rejected() {
        let m = MetricsConfig { per_frame: vec!["warp".into()], aggregate: vec![] };
        assert!(m.validate().is_err());
        let m = MetricsConfig { per_frame: vec![], aggregate: vec!["energy_drift_percent".into()] };
        assert!(m.validate().is_ok());
    }
}
