//! Stateful retrieval metrics.
//!
//! A [`RetrievalMetric`] accumulates `(indexes, preds, target)` batches and, on
//! [`compute`](RetrievalMetric::compute), groups the items by query index, scores every
//! query with its [`QueryMetric`], and averages the per-query values.

use crate::batch::RetrievalBatch;
use crate::checks::check_retrieval_inputs;
use crate::config::{EmptyTargetAction, MetricConfig};
use crate::error::MetricError;
use crate::functional::reciprocal_rank_f64;
use crate::precision::Score;

/// Scores a single query group whose inputs have already been validated.
pub trait QueryMetric: Default + Clone + Send + Sync + 'static {
    const NAME: &'static str;

    fn score<T: Score>(&self, preds: &[T], target: &[i64]) -> f64;
}

/// Reciprocal rank of the highest-scored relevant item.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReciprocalRank;

impl QueryMetric for ReciprocalRank {
    const NAME: &'static str = "mrr";

    fn score<T: Score>(&self, preds: &[T], target: &[i64]) -> f64 {
        reciprocal_rank_f64(preds, target)
    }
}

/// Mean reciprocal rank over query groups.
pub type RetrievalMrr<T = f32> = RetrievalMetric<T, ReciprocalRank>;

/// Average a query metric over every query in `batch`, honoring the empty-target policy.
pub fn aggregate<T: Score, M: QueryMetric>(
    config: &MetricConfig,
    metric: &M,
    batch: &RetrievalBatch<T>,
) -> Result<f64, MetricError> {
    let groups = batch.groups();
    let mut values = Vec::with_capacity(groups.len());
    let mut empty = 0usize;

    for group in &groups {
        if !group.has_positive() {
            empty += 1;
            match config.empty_target_action {
                EmptyTargetAction::Error => return Err(MetricError::NoPositiveTarget),
                EmptyTargetAction::Pos => values.push(1.0),
                EmptyTargetAction::Neg => values.push(0.0),
                EmptyTargetAction::Skip => {}
            }
        } else {
            values.push(metric.score(&group.preds, &group.target));
        }
    }

    tracing::debug!(
        metric = M::NAME,
        dtype = T::DTYPE,
        queries = groups.len(),
        empty_queries = empty,
        action = %config.empty_target_action,
        "Aggregated retrieval metric"
    );

    if values.is_empty() {
        return Ok(0.0);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// A retrieval metric that accumulates batches across calls.
#[derive(Debug, Clone)]
pub struct RetrievalMetric<T, M> {
    config: MetricConfig,
    metric: M,
    state: RetrievalBatch<T>,
}

impl<T: Score, M: QueryMetric> RetrievalMetric<T, M> {
    pub fn new(config: MetricConfig) -> Self {
        Self {
            config,
            metric: M::default(),
            state: RetrievalBatch::default(),
        }
    }

    /// Construct from textual arguments, rejecting unknown `empty_target_action` values.
    pub fn with_args(
        empty_target_action: &str,
        ignore_index: Option<i64>,
    ) -> Result<Self, MetricError> {
        Ok(Self::new(MetricConfig::from_args(
            empty_target_action,
            ignore_index,
        )?))
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Accumulated (already filtered) items.
    pub fn state(&self) -> &RetrievalBatch<T> {
        &self.state
    }

    pub fn num_queries(&self) -> usize {
        self.state.groups().len()
    }

    /// Validate a batch and add it to the state.
    pub fn update(
        &mut self,
        indexes: &[i64],
        preds: &[T],
        target: &[i64],
    ) -> Result<(), MetricError> {
        let batch = check_retrieval_inputs(indexes, preds, target, self.config.ignore_index)?;
        self.state.extend(batch);
        Ok(())
    }

    /// Metric value over this batch alone. The batch is also accumulated.
    pub fn forward(
        &mut self,
        indexes: &[i64],
        preds: &[T],
        target: &[i64],
    ) -> Result<T, MetricError> {
        let batch = check_retrieval_inputs(indexes, preds, target, self.config.ignore_index)?;
        let value = aggregate(&self.config, &self.metric, &batch)?;
        self.state.extend(batch);
        Ok(T::from_f64(value))
    }

    /// Metric value over everything accumulated so far.
    pub fn compute(&self) -> Result<T, MetricError> {
        aggregate(&self.config, &self.metric, &self.state).map(T::from_f64)
    }

    /// Append a state gathered from another worker.
    pub fn merge_state(&mut self, other: RetrievalBatch<T>) {
        self.state.extend(other);
    }

    pub fn reset(&mut self) {
        self.state = RetrievalBatch::default();
    }

    /// Hand the accumulated state over, leaving this metric empty.
    pub fn take_state(&mut self) -> RetrievalBatch<T> {
        std::mem::take(&mut self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mrr(action: &str) -> RetrievalMrr<f64> {
        RetrievalMrr::with_args(action, None).unwrap()
    }

    #[test]
    fn test_mean_over_queries() {
        let mut metric = mrr("neg");
        // query 0: relevant ranked 1st; query 1: relevant ranked 2nd
        metric
            .update(&[0, 0, 1, 1], &[0.9, 0.1, 0.2, 0.8], &[1, 0, 1, 0])
            .unwrap();
        assert!((metric.compute().unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(metric.num_queries(), 2);
    }

    #[test]
    fn test_empty_target_actions() {
        let indexes = [0, 0, 1, 1];
        let preds = [0.9, 0.1, 0.2, 0.8];
        let target = [0, 1, 0, 0];

        let expected = [("skip", 0.5), ("neg", 0.25), ("pos", 0.75)];
        for (action, value) in expected {
            let mut metric = mrr(action);
            metric.update(&indexes, &preds, &target).unwrap();
            assert!(
                (metric.compute().unwrap() - value).abs() < 1e-12,
                "action {action}"
            );
        }

        let mut metric = mrr("error");
        metric.update(&indexes, &preds, &target).unwrap();
        let err = metric.compute().unwrap_err();
        assert_eq!(
            err.to_string(),
            "`compute` method was provided with a query with no positive target."
        );
    }

    #[test]
    fn test_no_queries_computes_zero() {
        let mut metric = RetrievalMrr::<f32>::with_args("skip", Some(1)).unwrap();
        metric.update(&[0, 0], &[0.4, 0.6], &[1, 1]).unwrap();
        assert_eq!(metric.compute().unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_action() {
        let err = RetrievalMrr::<f32>::with_args("invalid_value", None).unwrap_err();
        assert!(err.to_string().contains("`skip`, `neg`, `pos`"));
    }

    #[test]
    fn test_forward_returns_batch_value_and_accumulates() {
        let mut metric = mrr("neg");
        let first = metric.forward(&[0, 0], &[0.9, 0.1], &[1, 0]).unwrap();
        let second = metric.forward(&[1, 1], &[0.2, 0.8], &[1, 0]).unwrap();
        assert_eq!(first, 1.0);
        assert_eq!(second, 0.5);
        assert!((metric.compute().unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_queries_spanning_batches() {
        let mut metric = mrr("neg");
        metric.update(&[3, 3], &[0.9, 0.5], &[0, 0]).unwrap();
        metric.update(&[3], &[0.7], &[1]).unwrap();
        assert!((metric.compute().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reset_and_take_state() {
        let mut metric = mrr("neg");
        metric.update(&[0], &[0.9], &[1]).unwrap();
        let state = metric.take_state();
        assert_eq!(state.len(), 1);
        assert!(metric.state().is_empty());

        metric.merge_state(state);
        assert_eq!(metric.compute().unwrap(), 1.0);
        metric.reset();
        assert_eq!(metric.compute().unwrap(), 0.0);
    }
}
