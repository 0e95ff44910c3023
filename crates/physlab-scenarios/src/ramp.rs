use physlab_core::vec3;
use physlab_model::{HarnessError, Result};

use crate::builder::{BodyBuilder, DescriptorSet};
use crate::params::{get_f32, require_non_negative, require_positive, ParamBag};

/// Box resting near the top of an inclined static slab.
pub struct FrictionRamp {
    pub ramp_angle: f32, // radians
    pub ramp_length: f32,
    pub box_size: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl FrictionRamp {
    pub fn from_params(params: &ParamBag) -> Result<Self> {
        let s = Self {
            ramp_angle: get_f32(params, "ramp_angle", 0.5),
            ramp_length: get_f32(params, "ramp_length", 10.0),
            box_size: get_f32(params, "box_size", 1.0),
            friction: get_f32(params, "friction", 0.3),
            restitution: get_f32(params, "restitution", 0.1),
        };
        if !s.ramp_angle.is_finite() || s.ramp_angle <= 0.0 || s.ramp_angle >= core::f32::consts::FRAC_PI_2 {
            return Err(HarnessError::spec_invalid(
                "scenario.params.ramp_angle",
                "must lie strictly between 0 and pi/2 radians",
            ));
        }
        require_positive(s.ramp_length, "scenario.params.ramp_length")?;
        require_positive(s.box_size, "scenario.params.box_size")?;
        require_non_negative(s.friction, "scenario.params.friction")?;
        require_non_negative(s.restitution, "scenario.params.restitution")?;
        Ok(s)
    }

    pub fn emit(&self, set: &mut DescriptorSet) {
        let (sin, cos) = self.ramp_angle.sin_cos();
        let ramp_height = (sin * self.ramp_length) / 2.0;
        let ramp_offset = (cos * self.ramp_length) / 2.0;

        set.add(
            BodyBuilder::new("ground")
                .position_xyz(0.0, -0.5, 0.0)
                .box_shape(50.0, 0.5, 50.0)
                .fixed()
                .friction(self.friction)
                .restitution(self.restitution),
        );

        // Inclined slab, rotated about Z so its top surface climbs along +X;
        // the lower end meets the ground plane near the origin.
        set.add(
            BodyBuilder::new("ramp")
                .position_xyz(ramp_offset, ramp_height, 0.0)
                .rotation(vec3(0.0, 0.0, 1.0), self.ramp_angle)
                .box_shape(self.ramp_length / 2.0, 0.5, 2.0)
                .fixed()
                .friction(self.friction)
                .restitution(self.restitution),
        );

        // Slider starts near the upper end, aligned with the slope and lifted
        // just clear of the surface.
        let box_half = self.box_size / 2.0;
        let along = self.ramp_length * 0.9;
        let clearance = 0.05;
        let start_x = cos * along;
        let start_y = sin * along + (0.5 + box_half) / cos + clearance;

        set.add(
            BodyBuilder::new("slider")
                .position_xyz(start_x, start_y, 0.0)
                .box_shape(box_half, box_half, box_half)
                .rotation(vec3(0.0, 0.0, 1.0), self.ramp_angle)
                .dynamic(1.0)
                .friction(self.friction)
                .restitution(self.restitution),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_model::BodyKind;

    #[test]
    fn three_bodies_with_static_ramp() {
        let s = FrictionRamp::from_params(&ParamBag::new()).unwrap();
        let mut set = DescriptorSet::new();
        s.emit(&mut set);
        let bodies = set.into_bodies();

        assert_eq!(bodies.len(), 3);
        assert_eq!(bodies[1].name, "ramp");
        assert_eq!(bodies[1].kind, BodyKind::Static);
        assert_eq!(bodies[2].kind, BodyKind::Dynamic);
        // slider starts above the slab's upper end
        assert!(bodies[2].initial_transform.position.y > bodies[1].initial_transform.position.y);
    }

    #[test]
    fn right_angle_ramp_is_rejected() {
        let mut p = ParamBag::new();
        p.insert("ramp_angle".into(), serde_yaml::Value::from(core::f32::consts::FRAC_PI_2 as f64));
        assert!(FrictionRamp::from_params(&p).is_err());
    }
}
