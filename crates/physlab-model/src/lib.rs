pub mod error;
pub mod spec;
pub mod descriptor;
pub mod metrics;
pub mod aggregate;
pub mod criteria;
pub mod report;
pub mod baseline;

pub use error::{HarnessError, Result};
pub use spec::{
    ExperimentSpec, ExperimentMetadata, ExperimentConfig, PhysicsConfig, DurationConfig,
    ScenarioConfig, MetricsConfig, CriterionSpec, BodySpec, ShapeSpec, BodyKind, API_VERSION,
};
pub use descriptor::{BodyDescriptor, Transform};
pub use metrics::{
    MetricFrame, EnergyMetrics, MomentumMetrics, ContactMetrics, BodyState, PEN_WARN,
};
pub use aggregate::{AggregateMetrics, STAB_WINDOW, STAB_KE};
pub use criteria::{AggregateKey, CriterionResult, resolve_criteria, evaluate_criteria};
pub use report::{SimulationReport, ReportStatus, REPORT_SCHEMA};
pub use baseline::{BaselineComparison, Recommendation, check_compatible, compare_to_baseline};
