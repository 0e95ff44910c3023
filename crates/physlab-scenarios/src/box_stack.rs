use physlab_model::Result;

use crate::builder::{BodyBuilder, DescriptorSet};
use crate::params::{get_f32, get_u32, get_vec3, require_non_negative, require_positive, ParamBag};

// Stacked boxes start this far apart so no pair overlaps on frame zero.
const STACK_GAP: f32 = 1.0e-3;

/// Stack of unit-mass boxes on a ground slab.
pub struct BoxStack {
    pub count: u32,
    pub box_size: [f32; 3],
    pub friction: f32,
    pub restitution: f32,
}

impl BoxStack {
    pub fn from_params(params: &ParamBag) -> Result<Self> {
        let s = Self {
            count: get_u32(params, "count", 10),
            box_size: get_vec3(params, "box_size", [1.0, 1.0, 1.0]),
            friction: get_f32(params, "friction", 0.5),
            restitution: get_f32(params, "restitution", 0.1),
        };
        if s.count == 0 {
            return Err(physlab_model::HarnessError::spec_invalid(
                "scenario.params.count",
                "must be at least 1",
            ));
        }
        for (i, d) in s.box_size.iter().enumerate() {
            require_positive(*d, &format!("scenario.params.box_size[{i}]"))?;
        }
        require_non_negative(s.friction, "scenario.params.friction")?;
        require_non_negative(s.restitution, "scenario.params.restitution")?;
        Ok(s)
    }

    pub fn emit(&self, set: &mut DescriptorSet) {
        let half_x = self.box_size[0] / 2.0;
        let half_y = self.box_size[1] / 2.0;
        let half_z = self.box_size[2] / 2.0;

        set.add(
            BodyBuilder::new("ground")
                .position_xyz(0.0, -0.5, 0.0)
                .box_shape(50.0, 0.5, 50.0)
                .fixed()
                .friction(self.friction)
                .restitution(self.restitution),
        );

        for i in 0..self.count {
            let y = half_y + STACK_GAP + (self.box_size[1] + STACK_GAP) * i as f32;
            set.add(
                BodyBuilder::new(format!("box_{i}"))
                    .position_xyz(0.0, y, 0.0)
                    .box_shape(half_x, half_y, half_z)
                    .dynamic(1.0)
                    .friction(self.friction)
                    .restitution(self.restitution),
            );
        }
    }
}
