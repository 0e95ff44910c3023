pub mod bodies;
pub mod broadphase;
pub mod narrowphase;
pub mod world;

pub use bodies::{Bodies, BodyDesc};
pub use broadphase::sweep_pairs;
pub use world::{SolverWorld, SolverConfig, StepStats, ContactSample, Collider};
