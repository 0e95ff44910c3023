use glam::{Vec3A, Mat3A, Quat};

/// Simulation scalar. All solver state is f32; aggregate arithmetic widens to f64.
pub type Scalar = f32;

pub type Vec3 = Vec3A;
pub type Mat3 = Mat3A;

#[inline] pub fn vec3(x: Scalar, y: Scalar, z: Scalar) -> Vec3 { Vec3::new(x, y, z) }
#[inline] pub fn iso(pos: Vec3, rot: Quat) -> Isometry { Isometry { pos, rot } }
#[inline] pub fn quat_identity() -> Quat { Quat::IDENTITY }

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Isometry { pub pos: Vec3, pub rot: Quat }

impl Isometry {
    /// Map a body-local point into world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.pos + self.rot * local
    }
}

impl Default for Isometry {
    fn default() -> Self { Self { pos: Vec3::ZERO, rot: Quat::IDENTITY } }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Velocity { pub lin: Vec3, pub ang: Vec3 }

impl Velocity {
    /// True when both components are under the given speed thresholds.
    #[inline]
    pub fn below(&self, lin: Scalar, ang: Scalar) -> bool {
        self.lin.length_squared() < lin * lin && self.ang.length_squared() < ang * ang
    }
}
