use physlab_model::Result;

use crate::builder::{BodyBuilder, DescriptorSet};
use crate::params::{get_f32, require_non_negative, require_positive, ParamBag};

/// Ball released at rest above a ground slab.
pub struct BouncingBall {
    pub radius: f32,
    pub drop_height: f32,
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl BouncingBall {
    pub fn from_params(params: &ParamBag) -> Result<Self> {
        let s = Self {
            radius: get_f32(params, "radius", 0.5),
            drop_height: get_f32(params, "drop_height", 10.0),
            restitution: get_f32(params, "restitution", 0.8),
            friction: get_f32(params, "friction", 0.3),
            density: get_f32(params, "density", 1.0),
        };
        require_positive(s.radius, "scenario.params.radius")?;
        require_positive(s.drop_height, "scenario.params.drop_height")?;
        require_positive(s.density, "scenario.params.density")?;
        require_non_negative(s.friction, "scenario.params.friction")?;
        require_non_negative(s.restitution, "scenario.params.restitution")?;
        Ok(s)
    }

    fn mass(&self) -> f32 {
        self.density * (4.0 / 3.0) * core::f32::consts::PI * self.radius.powi(3)
    }

    pub fn emit(&self, set: &mut DescriptorSet) {
        set.add(
            BodyBuilder::new("ground")
                .position_xyz(0.0, -0.5, 0.0)
                .box_shape(50.0, 0.5, 50.0)
                .fixed()
                .friction(self.friction)
                .restitution(self.restitution),
        );

        set.add(
            BodyBuilder::new("ball")
                .position_xyz(0.0, self.drop_height, 0.0)
                .sphere(self.radius)
                .dynamic(self.mass())
                .friction(self.friction)
                .restitution(self.restitution),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_core::types::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn ball_hangs_at_drop_height_at_rest() {
        let s = BouncingBall::from_params(&ParamBag::new()).unwrap();
        let mut set = DescriptorSet::new();
        s.emit(&mut set);
        let bodies = set.into_bodies();

        assert_eq!(bodies.len(), 2);
        assert_relative_eq!(bodies[1].initial_transform.position.y, 10.0);
        assert_eq!(bodies[1].initial_linear_velocity, Vec3::ZERO);
        assert_relative_eq!(bodies[1].restitution, 0.8);
    }
}
