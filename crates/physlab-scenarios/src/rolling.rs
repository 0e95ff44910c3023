use physlab_model::Result;

use crate::builder::{BodyBuilder, DescriptorSet};
use crate::params::{get_f32, get_vec3, require_non_negative, require_positive, ParamBag};

/// Sphere launched across a ground slab.
pub struct RollingSphere {
    pub radius: f32,
    pub initial_velocity: [f32; 3],
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
}

impl RollingSphere {
    pub fn from_params(params: &ParamBag) -> Result<Self> {
        let s = Self {
            radius: get_f32(params, "radius", 0.5),
            initial_velocity: get_vec3(params, "initial_velocity", [5.0, 0.0, 0.0]),
            friction: get_f32(params, "friction", 0.5),
            restitution: get_f32(params, "restitution", 0.1),
            density: get_f32(params, "density", 1.0),
        };
        require_positive(s.radius, "scenario.params.radius")?;
        require_positive(s.density, "scenario.params.density")?;
        require_non_negative(s.friction, "scenario.params.friction")?;
        require_non_negative(s.restitution, "scenario.params.restitution")?;
        Ok(s)
    }

    fn mass(&self) -> f32 {
        self.density * (4.0 / 3.0) * core::f32::consts::PI * self.radius.powi(3)
    }

    pub fn emit(&self, set: &mut DescriptorSet) {
        // long runway so a 10 s roll never reaches the edge
        set.add(
            BodyBuilder::new("ground")
                .position_xyz(0.0, -0.5, 0.0)
                .box_shape(100.0, 0.5, 10.0)
                .fixed()
                .friction(self.friction)
                .restitution(self.restitution),
        );

        set.add(
            BodyBuilder::new("sphere")
                .position_xyz(0.0, self.radius, 0.0)
                .velocity_xyz(
                    self.initial_velocity[0],
                    self.initial_velocity[1],
                    self.initial_velocity[2],
                )
                .sphere(self.radius)
                .dynamic(self.mass())
                .friction(self.friction)
                .restitution(self.restitution),
        );
    }
}
