//! Built-in scenarios, materialised as deterministic body descriptor
//! sequences. For identical inputs every builder returns byte-identical
//! output; ids are dense and follow insertion order.

mod builder;
mod params;
mod box_stack;
mod rolling;
mod bouncing;
mod ramp;

use physlab_model::{
    BodyDescriptor, BodyKind, HarnessError, PhysicsConfig, Result, ScenarioConfig,
};

pub use builder::{BodyBuilder, DescriptorSet};
pub use box_stack::BoxStack;
pub use rolling::RollingSphere;
pub use bouncing::BouncingBall;
pub use ramp::FrictionRamp;

/// Materialise a scenario configuration into the bodies the world will own.
/// Pure: equal inputs give equal descriptor sequences.
pub fn build_scenario(
    config: &ScenarioConfig,
    _physics: &PhysicsConfig,
) -> Result<Vec<BodyDescriptor>> {
    let mut set = DescriptorSet::new();
    match config {
        ScenarioConfig::Builtin { name, params } => match name.as_str() {
            "box_stack" => BoxStack::from_params(params)?.emit(&mut set),
            "rolling_sphere" => RollingSphere::from_params(params)?.emit(&mut set),
            "bouncing_ball" => BouncingBall::from_params(params)?.emit(&mut set),
            "friction_ramp" => FrictionRamp::from_params(params)?.emit(&mut set),
            other => {
                return Err(HarnessError::spec_invalid(
                    "scenario.name",
                    format!("unknown builtin scenario `{other}`"),
                ))
            }
        },
        ScenarioConfig::Custom { bodies } => {
            for spec in bodies {
                let mut b = BodyBuilder::new(&spec.name)
                    .shape(spec.shape)
                    .transform(spec.transform)
                    .velocity(spec.velocity)
                    .angular_velocity(spec.angular_velocity)
                    .friction(spec.friction)
                    .restitution(spec.restitution);
                b = match spec.kind {
                    BodyKind::Dynamic => b.dynamic(spec.mass),
                    BodyKind::Static => b.fixed(),
                };
                set.add(b);
            }
        }
    }
    Ok(set.into_bodies())
}

/// One tunable of a builtin scenario, for the catalogue listing.
pub struct ParamInfo {
    pub name: &'static str,
    pub default: &'static str,
    pub doc: &'static str,
}

pub struct ScenarioInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamInfo],
}

/// Names and parameter schemas of every builtin, in stable order.
pub fn catalog() -> &'static [ScenarioInfo] {
    &[
        ScenarioInfo {
            name: "box_stack",
            description: "Stack of boxes on a ground slab; exercises stacking stability and contacts",
            params: &[
                ParamInfo { name: "count", default: "10", doc: "number of stacked boxes" },
                ParamInfo { name: "box_size", default: "[1, 1, 1]", doc: "full box dimensions in metres" },
                ParamInfo { name: "friction", default: "0.5", doc: "friction for ground and boxes" },
                ParamInfo { name: "restitution", default: "0.1", doc: "restitution for ground and boxes" },
            ],
        },
        ScenarioInfo {
            name: "rolling_sphere",
            description: "Sphere launched across a ground slab; exercises friction handling",
            params: &[
                ParamInfo { name: "radius", default: "0.5", doc: "sphere radius in metres" },
                ParamInfo { name: "initial_velocity", default: "[5, 0, 0]", doc: "launch velocity in m/s" },
                ParamInfo { name: "friction", default: "0.5", doc: "friction for ground and sphere" },
                ParamInfo { name: "restitution", default: "0.1", doc: "restitution for ground and sphere" },
                ParamInfo { name: "density", default: "1.0", doc: "sphere density in kg/m^3" },
            ],
        },
        ScenarioInfo {
            name: "bouncing_ball",
            description: "Ball dropped from height; exercises restitution and energy accounting",
            params: &[
                ParamInfo { name: "radius", default: "0.5", doc: "ball radius in metres" },
                ParamInfo { name: "drop_height", default: "10", doc: "initial centre height in metres" },
                ParamInfo { name: "restitution", default: "0.8", doc: "restitution for ground and ball" },
                ParamInfo { name: "friction", default: "0.3", doc: "friction for ground and ball" },
                ParamInfo { name: "density", default: "1.0", doc: "ball density in kg/m^3" },
            ],
        },
        ScenarioInfo {
            name: "friction_ramp",
            description: "Box resting at the top of an inclined slab; exercises the friction cone",
            params: &[
                ParamInfo { name: "ramp_angle", default: "0.5", doc: "incline angle in radians" },
                ParamInfo { name: "ramp_length", default: "10", doc: "slab length in metres" },
                ParamInfo { name: "box_size", default: "1.0", doc: "slider edge length in metres" },
                ParamInfo { name: "friction", default: "0.3", doc: "friction for ramp and slider" },
                ParamInfo { name: "restitution", default: "0.1", doc: "restitution for ramp and slider" },
            ],
        },
    ]
}
