//! Error types for the ranklab-core crate.

use thiserror::Error;

/// Top-level error type for metric construction, input validation, and aggregation.
///
/// The `Display` text of each variant is stable: callers and tests match on it.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error(
        "Argument `empty_target_action` received a wrong value `{0}`; expected one of `error`, `skip`, `neg`, `pos`"
    )]
    InvalidEmptyTargetAction(String),

    #[error("`{0}` must be of the same shape")]
    ShapeMismatch(&'static str),

    #[error("`{0}` must be non-empty")]
    EmptyInput(&'static str),

    #[error("`target` must contain `binary` values")]
    NonBinaryTarget,

    #[error("`compute` method was provided with a query with no positive target.")]
    NoPositiveTarget,

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MetricError {
    /// Shape mismatch between the three class-metric inputs.
    pub fn retrieval_shape() -> Self {
        Self::ShapeMismatch("indexes`, `preds` and `target")
    }

    /// Shape mismatch between the two functional inputs.
    pub fn functional_shape() -> Self {
        Self::ShapeMismatch("preds` and `target")
    }

    pub fn retrieval_empty() -> Self {
        Self::EmptyInput("indexes`, `preds` and `target")
    }

    pub fn functional_empty() -> Self {
        Self::EmptyInput("preds` and `target")
    }

    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
