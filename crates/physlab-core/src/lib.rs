pub mod ids;
pub mod types;
pub mod hash;
pub mod determinism;

pub use ids::{BodyId, ColliderId};
pub use types::{Scalar, Vec3, Mat3, Isometry, Velocity, vec3, iso, quat_identity};
pub use hash::{StateDigest, Digest};
pub use determinism::DeterminismContract;
pub use glam::Quat;
