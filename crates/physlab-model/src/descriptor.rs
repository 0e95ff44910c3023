use serde::{Deserialize, Serialize};

use physlab_core::types::{Isometry, Vec3};
use physlab_core::Quat;
use crate::spec::{BodyKind, ShapeSpec};

/// Position + rotation pair as it appears on the wire and in metric frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default = "quat_identity")]
    pub rotation: Quat,
}

fn quat_identity() -> Quat { Quat::IDENTITY }

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Quat::IDENTITY }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, rotation: Quat::IDENTITY }
    }
}

impl From<Isometry> for Transform {
    fn from(iso: Isometry) -> Self {
        Self { position: iso.pos, rotation: iso.rot }
    }
}

impl From<Transform> for Isometry {
    fn from(t: Transform) -> Self {
        Isometry { pos: t.position, rot: t.rotation }
    }
}

/// What the scenario builder hands to the world: one body, fully specified.
/// `id` is dense and assigned in insertion order; the sequence is a pure
/// function of the scenario inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    pub id: u32,
    pub name: String,
    pub kind: BodyKind,
    pub shape: ShapeSpec,
    pub initial_transform: Transform,
    pub initial_linear_velocity: Vec3,
    pub initial_angular_velocity: Vec3,
    /// Infinite for static bodies.
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl BodyDescriptor {
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}
