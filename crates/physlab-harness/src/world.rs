use tracing::debug;

use physlab_core::types::Vec3;
use physlab_model::{
    BodyDescriptor, BodyState, ContactMetrics, EnergyMetrics, ExperimentSpec, HarnessError,
    MetricFrame, MomentumMetrics, Result, PEN_WARN,
};
use physlab_scenarios::build_scenario;

use crate::backend::{shape_of, EmbeddedSolver, SolverBackend};

pub type EmbeddedMetricWorld = MetricWorld<EmbeddedSolver>;

/// Wraps a solver backend, drives fixed-step integration, and extracts one
/// MetricFrame per step. Not safe for concurrent access; step/extract are
/// strictly sequential.
pub struct MetricWorld<S: SolverBackend> {
    spec: ExperimentSpec,
    solver: S,
    descriptors: Vec<BodyDescriptor>,
    timestep: f32,
    gravity: Vec3,
    target_steps: u64,
    step: u64,
    collect_bodies: bool,
    last_frame: Option<MetricFrame>,
}

impl<S: SolverBackend> MetricWorld<S> {
    /// Build the scenario and populate a fresh solver. Emits no frame.
    pub fn new(spec: &ExperimentSpec) -> Result<Self> {
        spec.validate()?;
        let physics = spec.spec.physics;
        let descriptors = build_scenario(&spec.spec.scenario, &physics)?;

        let mut solver = S::from_config(&physics);
        for desc in &descriptors {
            solver.insert_body(desc)?;
        }

        let target_steps = spec.spec.duration.target_steps(physics.timestep);
        debug!(
            experiment = %spec.metadata.name,
            bodies = descriptors.len(),
            steps = target_steps,
            "world constructed"
        );

        Ok(Self {
            spec: spec.clone(),
            solver,
            descriptors,
            timestep: physics.timestep,
            gravity: physics.gravity,
            target_steps,
            step: 0,
            collect_bodies: spec.spec.metrics.collect_bodies(),
            last_frame: None,
        })
    }

    #[inline] pub fn current_step(&self) -> u64 { self.step }
    #[inline] pub fn target_steps(&self) -> u64 { self.target_steps }
    #[inline] pub fn is_complete(&self) -> bool { self.step == self.target_steps }
    #[inline] pub fn timestep(&self) -> f32 { self.timestep }
    #[inline] pub fn body_count(&self) -> usize { self.descriptors.len() }
    #[inline] pub fn descriptors(&self) -> &[BodyDescriptor] { &self.descriptors }
    #[inline] pub fn last_frame(&self) -> Option<&MetricFrame> { self.last_frame.as_ref() }

    /// Advance exactly one timestep and return the post-step frame.
    pub fn step(&mut self) -> Result<MetricFrame> {
        if self.is_complete() {
            return Err(HarnessError::AlreadyComplete);
        }
        self.solver.step(self.timestep, self.gravity)?;
        let frame = self.extract_frame(self.step);
        self.step += 1;
        self.last_frame = Some(frame.clone());
        Ok(frame)
    }

    /// Discard solver state and rebuild from the original spec.
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::new(&self.spec)?;
        Ok(())
    }

    /// Digest of the current solver state, for determinism checks.
    pub fn state_hash(&self) -> physlab_core::Digest {
        self.solver.state_hash(self.timestep)
    }

    /// Pure readout of the post-step solver state. All reductions run in
    /// body-id order so float sums are reproducible.
    fn extract_frame(&self, step: u64) -> MetricFrame {
        let g_mag = self.gravity.length();

        let mut kinetic = 0.0f32;
        let mut potential = 0.0f32;
        let mut linear = Vec3::ZERO;
        let mut angular = Vec3::ZERO;

        for desc in &self.descriptors {
            if !desc.is_dynamic() {
                continue;
            }
            let m = desc.mass;
            let vel = self.solver.body_velocity(desc.id);
            let pose = self.solver.body_pose(desc.id);

            // scalar inertia of the bounding sphere stands in for the tensor
            let r = shape_of(&desc.shape).bounding_radius();
            let i_s = 0.4 * m * r * r;

            kinetic += 0.5 * m * vel.lin.length_squared() + 0.5 * i_s * vel.ang.length_squared();
            potential += m * g_mag * pose.pos.y;
            linear += vel.lin * m;
            angular += vel.ang * i_s;
        }

        let mut contacts = ContactMetrics::default();
        for manifold in self.solver.manifolds() {
            let mut manifold_max = 0.0f32;
            for point in &manifold.points {
                if point.penetration > 0.0 {
                    manifold_max = manifold_max.max(point.penetration);
                    contacts.total_penetration += point.penetration;
                }
            }
            // speculative manifolds whose surfaces never met are not active
            if manifold_max > 0.0 {
                contacts.contact_count += 1;
                contacts.max_penetration = contacts.max_penetration.max(manifold_max);
                if manifold_max > PEN_WARN {
                    contacts.constraint_violations += 1;
                }
            }
        }

        let bodies = if self.collect_bodies {
            self.descriptors
                .iter()
                .map(|desc| {
                    let pose = self.solver.body_pose(desc.id);
                    let vel = self.solver.body_velocity(desc.id);
                    BodyState {
                        id: desc.id,
                        name: desc.name.clone(),
                        transform: pose.into(),
                        linear_velocity: vel.lin,
                        angular_velocity: vel.ang,
                        sleeping: self.solver.body_sleeping(desc.id),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        MetricFrame {
            step,
            time: step as f32 * self.timestep,
            energy: EnergyMetrics::new(kinetic, potential),
            momentum: MomentumMetrics::new(linear, angular),
            contacts,
            bodies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ContactManifold, SolverBackend};
    use physlab_core::types::{Isometry, Velocity};
    use physlab_model::PhysicsConfig;
    use approx::assert_relative_eq;

    /// Analytic free-flight backend: no contacts, symplectic Euler on dynamic
    /// bodies. Lets the harness be tested without any collision machinery.
    struct BallisticSolver {
        poses: Vec<Isometry>,
        vels: Vec<Velocity>,
        dynamic: Vec<bool>,
        seed: u64,
    }

    impl SolverBackend for BallisticSolver {
        fn from_config(config: &PhysicsConfig) -> Self {
            Self { poses: vec![], vels: vec![], dynamic: vec![], seed: config.seed }
        }

        fn insert_body(&mut self, desc: &BodyDescriptor) -> physlab_model::Result<u32> {
            self.poses.push(desc.initial_transform.into());
            self.vels.push(Velocity {
                lin: desc.initial_linear_velocity,
                ang: desc.initial_angular_velocity,
            });
            self.dynamic.push(desc.is_dynamic());
            Ok((self.poses.len() - 1) as u32)
        }

        fn step(&mut self, dt: f32, gravity: Vec3) -> physlab_model::Result<()> {
            for i in 0..self.poses.len() {
                if !self.dynamic[i] { continue; }
                self.vels[i].lin += gravity * dt;
                self.poses[i].pos += self.vels[i].lin * dt;
            }
            Ok(())
        }

        fn body_pose(&self, id: u32) -> Isometry { self.poses[id as usize] }
        fn body_velocity(&self, id: u32) -> Velocity { self.vels[id as usize] }
        fn body_sleeping(&self, _id: u32) -> bool { false }
        fn manifolds(&self) -> Vec<ContactManifold> { Vec::new() }

        fn state_hash(&self, dt: f32) -> physlab_core::Digest {
            let mut d = physlab_core::StateDigest::new();
            d.scalar(dt);
            d.bytes(&self.seed.to_le_bytes());
            for (p, v) in self.poses.iter().zip(&self.vels) {
                d.pose(p);
                d.velocity(v);
            }
            d.finish()
        }
    }

    fn drop_spec(steps: u64) -> ExperimentSpec {
        let yaml = format!(
            r#"
apiVersion: simuforge/v1
kind: Experiment
metadata:
  name: harness-unit
spec:
  physics:
    timestep: 0.016666667
    gravity: [0, -9.81, 0]
  duration:
    type: fixed
    steps: {steps}
  scenario:
    type: custom
    bodies:
      - name: probe
        shape:
          type: sphere
          radius: 0.5
        transform:
          position: [0, 10, 0]
        mass: 2.0
"#
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[test]
    fn frames_are_monotonic_and_timed() {
        let mut world: MetricWorld<BallisticSolver> = MetricWorld::new(&drop_spec(20)).unwrap();
        for i in 0..20u64 {
            let frame = world.step().unwrap();
            assert_eq!(frame.step, i);
            assert_relative_eq!(frame.time, i as f32 * world.timestep(), epsilon = 1e-6);
        }
        assert!(world.is_complete());
    }

    #[test]
    fn stepping_past_completion_is_already_complete() {
        let mut world: MetricWorld<BallisticSolver> = MetricWorld::new(&drop_spec(2)).unwrap();
        world.step().unwrap();
        world.step().unwrap();
        assert!(matches!(world.step(), Err(HarnessError::AlreadyComplete)));
    }

    #[test]
    fn energy_decomposes_into_kinetic_plus_potential() {
        let mut world: MetricWorld<BallisticSolver> = MetricWorld::new(&drop_spec(30)).unwrap();
        for _ in 0..30 {
            let f = world.step().unwrap();
            let err = (f.energy.total - (f.energy.kinetic + f.energy.potential)).abs();
            assert!(err < 1e-6 * f.energy.total.abs().max(1.0));
        }
    }

    #[test]
    fn falling_probe_trades_potential_for_kinetic() {
        let mut world: MetricWorld<BallisticSolver> = MetricWorld::new(&drop_spec(30)).unwrap();
        let first = world.step().unwrap();
        let mut last = first.clone();
        for _ in 1..30 {
            last = world.step().unwrap();
        }
        assert!(last.energy.kinetic > first.energy.kinetic);
        assert!(last.energy.potential < first.energy.potential);
        // momentum magnitude grows as m * g * t
        assert!(last.momentum.linear_magnitude > first.momentum.linear_magnitude);
    }

    #[test]
    fn reset_replays_identically() {
        let mut world: MetricWorld<BallisticSolver> = MetricWorld::new(&drop_spec(10)).unwrap();
        let mut first_run = Vec::new();
        for _ in 0..10 {
            first_run.push(world.step().unwrap());
        }
        let hash_a = world.state_hash();

        world.reset().unwrap();
        assert_eq!(world.current_step(), 0);
        let mut second_run = Vec::new();
        for _ in 0..10 {
            second_run.push(world.step().unwrap());
        }
        assert_eq!(first_run, second_run);
        assert_eq!(hash_a, world.state_hash());
    }

    #[test]
    fn body_states_follow_the_metrics_config() {
        let mut spec = drop_spec(1);
        spec.spec.metrics.per_frame = vec!["energy".into(), "contacts".into()];
        let mut world: MetricWorld<BallisticSolver> = MetricWorld::new(&spec).unwrap();
        let frame = world.step().unwrap();
        assert!(frame.bodies.is_empty());

        let mut world: MetricWorld<BallisticSolver> = MetricWorld::new(&drop_spec(1)).unwrap();
        let frame = world.step().unwrap();
        assert_eq!(frame.bodies.len(), 1);
        assert_eq!(frame.bodies[0].name, "probe");
    }
}
