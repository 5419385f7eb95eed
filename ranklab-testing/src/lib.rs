//! # ranklab-testing: Reference checks for ranklab metrics
//!
//! - [`reference`]: the label-ranking-average-precision scorer and the reciprocal-rank
//!   adapter built on it, plus the reference aggregation over query groups.
//! - [`fixtures`]: seeded batches shared by every test.
//! - [`tester`]: [`RetrievalMetricTester`], which runs a metric and the reference side by
//!   side (single process, simulated workers, reduced precision, invalid arguments).
//! - [`scenario`]: scenario records and the runner that dispatches them.

pub mod fixtures;
pub mod reference;
pub mod scenario;
pub mod tester;

pub use fixtures::RetrievalInputs;
pub use scenario::{Expected, MetricArgs, Mode, Scenario, ScenarioInput, run_scenario};
pub use tester::{Device, MetricUnderTest, Mrr, RetrievalMetricTester};
