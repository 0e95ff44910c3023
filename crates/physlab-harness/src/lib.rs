//! Experiment execution pipeline: a metric-collecting wrapper over a
//! deterministic rigid-body solver, plus the runner that turns an experiment
//! document into a pass/fail report.

pub mod backend;
pub mod world;
pub mod runner;

pub use backend::{SolverBackend, EmbeddedSolver, ContactManifold, ContactPoint};
pub use world::{MetricWorld, EmbeddedMetricWorld};
pub use runner::{run, run_collect};
