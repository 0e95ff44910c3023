use physlab_core::types::{Mat3, Vec3};
use crate::Shape;

/// Per-collider surface response. Friction is a single coefficient applied to
/// both the static and kinetic cones; pairs combine by geometric mean.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material { pub friction: f32, pub restitution: f32 }

impl Default for Material {
    fn default() -> Self { Self { friction: 0.5, restitution: 0.1 } }
}

impl Material {
    /// Deterministic pairwise combine: geometric-mean friction, max restitution.
    pub fn combine(a: Material, b: Material) -> Material {
        Material {
            friction: (a.friction * b.friction).abs().sqrt(),
            restitution: a.restitution.max(b.restitution),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct MassProps {
    pub mass: f32,
    pub inv_mass: f32,
    pub inertia: Mat3,
}

impl MassProps {
    pub fn infinite() -> Self {
        Self { mass: f32::INFINITY, inv_mass: 0.0, inertia: Mat3::IDENTITY }
    }

    /// Inertia of `shape` scaled so total mass is exactly `mass`.
    pub fn from_shape(shape: &Shape, mass: f32) -> Self {
        match *shape {
            Shape::Sphere { r } => Self::sphere(r, mass),
            Shape::Box { hx, hy, hz } => Self::cuboid(Vec3::new(hx, hy, hz), mass),
            Shape::Capsule { r, hh } => Self::capsule(r, hh, mass),
            Shape::Cylinder { r, hh } => Self::cylinder(r, hh, mass),
        }
    }

    pub fn sphere(radius: f32, m: f32) -> Self {
        let ii = 0.4 * m * radius * radius;
        Self { mass: m, inv_mass: 1.0 / m, inertia: Mat3::from_diagonal(Vec3::splat(ii).into()) }
    }

    pub fn cuboid(half: Vec3, m: f32) -> Self {
        let dims = half * 2.0;
        let x2 = dims.x * dims.x;
        let y2 = dims.y * dims.y;
        let z2 = dims.z * dims.z;
        let ix = (1.0 / 12.0) * m * (y2 + z2);
        let iy = (1.0 / 12.0) * m * (x2 + z2);
        let iz = (1.0 / 12.0) * m * (x2 + y2);
        Self { mass: m, inv_mass: 1.0 / m, inertia: Mat3::from_diagonal(Vec3::new(ix, iy, iz).into()) }
    }

    pub fn capsule(radius: f32, half_h: f32, m: f32) -> Self {
        let h = half_h * 2.0;
        let ix = 0.25 * m * radius * radius + (1.0 / 12.0) * m * h * h;
        let iy = 0.5 * m * radius * radius;
        let iz = ix;
        Self { mass: m, inv_mass: 1.0 / m, inertia: Mat3::from_diagonal(Vec3::new(ix, iy, iz).into()) }
    }

    pub fn cylinder(radius: f32, half_h: f32, m: f32) -> Self {
        let h = half_h * 2.0;
        let ix = (1.0 / 12.0) * m * (3.0 * radius * radius + h * h);
        let iy = 0.5 * m * radius * radius;
        let iz = ix;
        Self { mass: m, inv_mass: 1.0 / m, inertia: Mat3::from_diagonal(Vec3::new(ix, iy, iz).into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_cube_unit_mass() {
        let mp = MassProps::from_shape(&Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 }, 1.0);
        assert_relative_eq!(mp.mass, 1.0);
        assert_relative_eq!(mp.inv_mass, 1.0);
        // solid cube: I = m/6 on every axis
        assert_relative_eq!(mp.inertia.x_axis.x, 1.0 / 6.0, epsilon = 1e-6);
    }

    #[test]
    fn static_bodies_have_no_inverse_mass() {
        let mp = MassProps::infinite();
        assert_eq!(mp.inv_mass, 0.0);
        assert!(mp.mass.is_infinite());
    }

    #[test]
    fn friction_combines_by_geometric_mean() {
        let a = Material { friction: 0.9, restitution: 0.0 };
        let b = Material { friction: 0.0, restitution: 0.4 };
        let c = Material::combine(a, b);
        assert_relative_eq!(c.friction, 0.0);
        assert_relative_eq!(c.restitution, 0.4);
    }
}
