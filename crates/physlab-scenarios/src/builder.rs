use physlab_core::types::Vec3;
use physlab_core::Quat;
use physlab_model::{BodyDescriptor, BodyKind, ShapeSpec, Transform};

/// Accumulates descriptors and hands out dense ids in insertion order.
pub struct DescriptorSet {
    bodies: Vec<BodyDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self { bodies: Vec::new() }
    }

    pub fn add(&mut self, builder: BodyBuilder) -> u32 {
        let id = self.bodies.len() as u32;
        self.bodies.push(builder.build(id));
        id
    }

    pub fn into_bodies(self) -> Vec<BodyDescriptor> {
        self.bodies
    }
}

impl Default for DescriptorSet {
    fn default() -> Self { Self::new() }
}

/// Fluent descriptor construction, id assigned by the owning set.
pub struct BodyBuilder {
    name: String,
    kind: BodyKind,
    shape: ShapeSpec,
    transform: Transform,
    velocity: Vec3,
    angular_velocity: Vec3,
    mass: f32,
    friction: f32,
    restitution: f32,
}

impl BodyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BodyKind::Dynamic,
            shape: ShapeSpec::Box { half_extents: Vec3::splat(0.5) },
            transform: Transform::default(),
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            friction: 0.5,
            restitution: 0.1,
        }
    }

    pub fn shape(mut self, shape: ShapeSpec) -> Self {
        self.shape = shape;
        self
    }

    pub fn box_shape(self, hx: f32, hy: f32, hz: f32) -> Self {
        self.shape(ShapeSpec::Box { half_extents: Vec3::new(hx, hy, hz) })
    }

    pub fn sphere(self, radius: f32) -> Self {
        self.shape(ShapeSpec::Sphere { radius })
    }

    pub fn transform(mut self, t: Transform) -> Self {
        self.transform = t;
        self
    }

    pub fn position_xyz(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.position = Vec3::new(x, y, z);
        self
    }

    pub fn rotation(mut self, axis: Vec3, angle: f32) -> Self {
        self.transform.rotation = Quat::from_axis_angle(axis.normalize().into(), angle);
        self
    }

    pub fn velocity(mut self, v: Vec3) -> Self {
        self.velocity = v;
        self
    }

    pub fn velocity_xyz(self, x: f32, y: f32, z: f32) -> Self {
        self.velocity(Vec3::new(x, y, z))
    }

    pub fn angular_velocity(mut self, w: Vec3) -> Self {
        self.angular_velocity = w;
        self
    }

    pub fn dynamic(mut self, mass: f32) -> Self {
        self.kind = BodyKind::Dynamic;
        self.mass = mass;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.kind = BodyKind::Static;
        self.mass = f32::INFINITY;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    fn build(self, id: u32) -> BodyDescriptor {
        BodyDescriptor {
            id,
            name: self.name,
            kind: self.kind,
            shape: self.shape,
            initial_transform: self.transform,
            initial_linear_velocity: self.velocity,
            initial_angular_velocity: self.angular_velocity,
            mass: self.mass,
            friction: self.friction,
            restitution: self.restitution,
        }
    }
}
