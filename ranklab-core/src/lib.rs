//! # ranklab-core: Retrieval Ranking Metrics
//!
//! Mean reciprocal rank over grouped retrieval results, in two forms:
//!
//! - [`functional::retrieval_reciprocal_rank`] scores a single query.
//! - [`RetrievalMrr`] accumulates `(indexes, preds, target)` batches across calls and
//!   averages the per-query reciprocal rank on [`compute`](RetrievalMetric::compute).
//!
//! Queries without a relevant item follow the configured [`EmptyTargetAction`], and
//! items whose target equals `ignore_index` are dropped before scoring. States from
//! several simulated workers can be gathered with [`distributed::evaluate_sharded`].

pub mod batch;
pub mod checks;
pub mod config;
pub mod distributed;
pub mod error;
pub mod functional;
pub mod metric;
pub mod precision;

// Re-exports
pub use batch::{QueryGroup, RetrievalBatch};
pub use config::{EmptyTargetAction, MetricConfig, RanklabConfig, load_config};
pub use error::MetricError;
pub use functional::retrieval_reciprocal_rank;
pub use metric::{QueryMetric, ReciprocalRank, RetrievalMetric, RetrievalMrr};
pub use precision::Score;
