use physlab_core::types::{Isometry, Vec3, Mat3};
use glam::Mat3A;
use crate::aabb::Aabb;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere { r: f32 },
    Box { hx: f32, hy: f32, hz: f32 },
    Capsule { r: f32, hh: f32 },  // half-height along local Y, excluding caps
    Cylinder { r: f32, hh: f32 }, // half-height along local Y
}

impl Shape {
    /// Radius of the tightest sphere centred on the body origin that contains
    /// the shape. Used for the scalar-inertia fallback in metric extraction.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Sphere { r } => r,
            Shape::Box { hx, hy, hz } => (hx * hx + hy * hy + hz * hz).sqrt(),
            Shape::Capsule { r, hh } => hh + r,
            Shape::Cylinder { r, hh } => (r * r + hh * hh).sqrt(),
        }
    }
}

#[inline]
pub fn aabb_of(shape: &Shape, xf: &Isometry) -> Aabb {
    match *shape {
        Shape::Sphere { r } => Aabb::from_center_half_extents(xf.pos, Vec3::splat(r)),
        Shape::Box { hx, hy, hz } => {
            let he = Vec3::new(hx, hy, hz);
            let rot = Mat3A::from_quat(xf.rot);
            let m = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
            let world_he = m * he;
            Aabb::from_center_half_extents(xf.pos, world_he)
        }
        Shape::Capsule { r, hh } | Shape::Cylinder { r, hh } => {
            let axis_world = xf.rot * Vec3::Y * hh.abs();
            let he = axis_world.abs() + Vec3::splat(r);
            Aabb::from_center_half_extents(xf.pos, he)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_core::{vec3, iso, quat_identity};
    use approx::assert_relative_eq;

    #[test]
    fn box_aabb_grows_under_rotation() {
        let s = Shape::Box { hx: 1.0, hy: 1.0, hz: 1.0 };
        let upright = aabb_of(&s, &iso(Vec3::ZERO, quat_identity()));
        assert_relative_eq!(upright.max.y, 1.0, epsilon = 1e-6);

        let tilted = aabb_of(&s, &iso(Vec3::ZERO, glam::Quat::from_rotation_z(0.5)));
        assert!(tilted.max.x > upright.max.x);
    }

    #[test]
    fn bounding_radius_contains_shape() {
        assert_relative_eq!(Shape::Sphere { r: 0.5 }.bounding_radius(), 0.5);
        assert_relative_eq!(Shape::Capsule { r: 0.25, hh: 0.5 }.bounding_radius(), 0.75);
        let b = Shape::Box { hx: 1.0, hy: 1.0, hz: 1.0 }.bounding_radius();
        assert_relative_eq!(b, 3.0f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn capsule_aabb_covers_caps() {
        let s = Shape::Capsule { r: 0.25, hh: 0.5 };
        let bb = aabb_of(&s, &iso(vec3(0.0, 1.0, 0.0), quat_identity()));
        assert_relative_eq!(bb.max.y, 1.75, epsilon = 1e-6);
        assert_relative_eq!(bb.min.y, 0.25, epsilon = 1e-6);
    }
}
