use physlab_core::types::{Isometry, Velocity, Vec3};
use physlab_core::Digest;
use physlab_geom::{MassProps, Material, Shape};
use physlab_model::{BodyDescriptor, BodyKind, HarnessError, PhysicsConfig, Result, ShapeSpec};
use physlab_solver::{SolverConfig, SolverWorld};

/// Owned copy of one contact manifold, safe to keep after the solver moves on.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub body_a: u32,
    pub body_b: u32,
    pub points: Vec<ContactPoint>,
}

#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    pub penetration: f32,
}

impl ContactManifold {
    pub fn max_penetration(&self) -> f32 {
        self.points.iter().map(|p| p.penetration).fold(0.0, f32::max)
    }
}

/// The capability set the harness needs from a rigid-body solver. Everything
/// returned is an owned copy; no frame data aliases solver memory.
pub trait SolverBackend {
    fn from_config(config: &PhysicsConfig) -> Self
    where
        Self: Sized;

    /// Bodies must come back with dense handles in insertion order.
    fn insert_body(&mut self, desc: &BodyDescriptor) -> Result<u32>;

    fn step(&mut self, dt: f32, gravity: Vec3) -> Result<()>;

    fn body_pose(&self, id: u32) -> Isometry;
    fn body_velocity(&self, id: u32) -> Velocity;
    fn body_sleeping(&self, id: u32) -> bool;

    fn manifolds(&self) -> Vec<ContactManifold>;

    fn state_hash(&self, dt: f32) -> Digest;
}

pub(crate) fn shape_of(spec: &ShapeSpec) -> Shape {
    match *spec {
        ShapeSpec::Box { half_extents } => Shape::Box {
            hx: half_extents.x,
            hy: half_extents.y,
            hz: half_extents.z,
        },
        ShapeSpec::Sphere { radius } => Shape::Sphere { r: radius },
        ShapeSpec::Capsule { half_height, radius } => Shape::Capsule { r: radius, hh: half_height },
        ShapeSpec::Cylinder { half_height, radius } => Shape::Cylinder { r: radius, hh: half_height },
    }
}

/* ---------------- embedded backend ---------------- */

/// The in-tree impulse solver behind the backend seam.
pub struct EmbeddedSolver {
    world: SolverWorld,
}

impl SolverBackend for EmbeddedSolver {
    fn from_config(config: &PhysicsConfig) -> Self {
        let world = SolverWorld::new(SolverConfig {
            iterations: config.solver_iterations.max(1),
            enhanced_determinism: config.enhanced_determinism,
            seed: config.seed,
        });
        Self { world }
    }

    fn insert_body(&mut self, desc: &BodyDescriptor) -> Result<u32> {
        let shape = shape_of(&desc.shape);
        let dynamic = desc.kind == BodyKind::Dynamic;
        let mass = if dynamic {
            MassProps::from_shape(&shape, desc.mass)
        } else {
            MassProps::infinite()
        };
        let material = Material { friction: desc.friction, restitution: desc.restitution };

        let body = self.world.add_body(
            desc.initial_transform.into(),
            Velocity { lin: desc.initial_linear_velocity, ang: desc.initial_angular_velocity },
            mass,
            dynamic,
        );
        if body.0 != desc.id {
            return Err(HarnessError::SolverError {
                message: format!("solver handle {} does not match descriptor id {}", body.0, desc.id),
            });
        }
        self.world.add_collider(body, shape, material);
        Ok(body.0)
    }

    fn step(&mut self, dt: f32, gravity: Vec3) -> Result<()> {
        self.world.step(dt, gravity);
        Ok(())
    }

    fn body_pose(&self, id: u32) -> Isometry {
        self.world.body_pose(physlab_core::BodyId(id))
    }

    fn body_velocity(&self, id: u32) -> Velocity {
        self.world.body_vel(physlab_core::BodyId(id))
    }

    fn body_sleeping(&self, id: u32) -> bool {
        self.world.body_sleeping(physlab_core::BodyId(id))
    }

    fn manifolds(&self) -> Vec<ContactManifold> {
        self.world
            .contacts()
            .iter()
            .map(|c| ContactManifold {
                body_a: c.body_a.0,
                body_b: c.body_b.0,
                points: vec![ContactPoint { penetration: c.depth }],
            })
            .collect()
    }

    fn state_hash(&self, dt: f32) -> Digest {
        self.world.state_hash(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_core::vec3;
    use physlab_model::Transform;

    fn descriptor(id: u32, y: f32, kind: BodyKind) -> BodyDescriptor {
        BodyDescriptor {
            id,
            name: format!("body_{id}"),
            kind,
            shape: ShapeSpec::Sphere { radius: 0.5 },
            initial_transform: Transform::from_position(vec3(0.0, y, 0.0)),
            initial_linear_velocity: Vec3::ZERO,
            initial_angular_velocity: Vec3::ZERO,
            mass: if kind == BodyKind::Dynamic { 1.0 } else { f32::INFINITY },
            friction: 0.5,
            restitution: 0.1,
        }
    }

    #[test]
    fn handles_match_descriptor_ids() {
        let mut solver = EmbeddedSolver::from_config(&PhysicsConfig::default());
        for i in 0..4 {
            let h = solver.insert_body(&descriptor(i, 5.0 + i as f32 * 2.0, BodyKind::Dynamic)).unwrap();
            assert_eq!(h, i);
        }
    }

    #[test]
    fn out_of_order_descriptor_is_refused() {
        let mut solver = EmbeddedSolver::from_config(&PhysicsConfig::default());
        let err = solver.insert_body(&descriptor(3, 5.0, BodyKind::Dynamic)).unwrap_err();
        assert!(matches!(err, HarnessError::SolverError { .. }));
    }

    #[test]
    fn gravity_moves_dynamic_bodies_only() {
        let mut solver = EmbeddedSolver::from_config(&PhysicsConfig::default());
        solver.insert_body(&descriptor(0, 10.0, BodyKind::Static)).unwrap();
        solver.insert_body(&descriptor(1, 20.0, BodyKind::Dynamic)).unwrap();
        solver.step(1.0 / 60.0, vec3(0.0, -9.81, 0.0)).unwrap();
        assert_eq!(solver.body_pose(0).pos.y, 10.0);
        assert!(solver.body_pose(1).pos.y < 20.0);
    }
}
