//! Shared harness for retrieval metrics.
//!
//! Each `run_*` method drives one kind of check and panics with context when the
//! metric under test disagrees with the reference or fails differently than expected.

use crate::fixtures::RetrievalInputs;
use crate::reference::{ReferenceFn, compute_reference_metric};
use half::f16;
use ranklab_core::distributed::evaluate_sharded;
use ranklab_core::functional::retrieval_reciprocal_rank;
use ranklab_core::{
    MetricConfig, MetricError, QueryMetric, ReciprocalRank, RetrievalBatch, RetrievalMetric,
    Score,
};

/// Simulated workers used by the distributed checks.
pub const NUM_PROCESSES: usize = 2;

/// Default absolute tolerance for full-precision comparisons.
pub const ATOL: f64 = 1e-6;

/// A metric family under test: its stateful form and its functional form.
pub trait MetricUnderTest {
    type Query: QueryMetric;

    fn functional<T: Score>(preds: &[T], target: &[i64]) -> Result<T, MetricError>;
}

/// Mean reciprocal rank.
pub struct Mrr;

impl MetricUnderTest for Mrr {
    type Query = ReciprocalRank;

    fn functional<T: Score>(preds: &[T], target: &[i64]) -> Result<T, MetricError> {
        retrieval_reciprocal_rank(preds, target)
    }
}

/// Where a precision check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Gpu,
}

impl Device {
    /// Only the CPU path exists; no accelerator backend is compiled into ranklab.
    pub fn is_available(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

fn assert_close(actual: f64, expected: f64, atol: f64, context: &str) {
    assert!(
        (actual - expected).abs() <= atol,
        "{context}: metric returned {actual}, reference {expected} (atol {atol})"
    );
}

fn assert_error_message<V: std::fmt::Debug>(
    result: Result<V, MetricError>,
    message: &str,
    context: &str,
) {
    match result {
        Ok(value) => panic!("{context}: expected an error containing {message:?}, got {value:?}"),
        Err(err) => {
            let text = err.to_string();
            assert!(
                text.contains(message),
                "{context}: error {text:?} does not contain {message:?}"
            );
        }
    }
}

fn class_metric_chain<M: QueryMetric>(
    empty_target_action: &str,
    ignore_index: Option<i64>,
    batch: &RetrievalBatch<f64>,
) -> Result<f64, MetricError> {
    let mut metric = RetrievalMetric::<f64, M>::with_args(empty_target_action, ignore_index)?;
    metric.update(&batch.indexes, &batch.preds, &batch.target)?;
    metric.compute()
}

#[derive(Debug, Clone)]
pub struct RetrievalMetricTester {
    pub atol: f64,
}

impl Default for RetrievalMetricTester {
    fn default() -> Self {
        Self { atol: ATOL }
    }
}

impl RetrievalMetricTester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_atol(atol: f64) -> Self {
        Self { atol }
    }

    /// Stateful metric vs the aggregated reference.
    ///
    /// Single-process runs also compare every batch's `forward` value against the
    /// reference on that batch alone. Distributed runs shard the batches over
    /// [`NUM_PROCESSES`] workers and compare the synced value.
    pub fn run_class_metric_test<U: MetricUnderTest>(
        &self,
        ddp: bool,
        inputs: &RetrievalInputs,
        config: MetricConfig,
        reference: ReferenceFn,
    ) {
        let context = format!(
            "{} (ddp={ddp}, empty_target_action={}, ignore_index={:?})",
            inputs.name, config.empty_target_action, config.ignore_index
        );
        let reference_over = |batch: &RetrievalBatch<f64>| {
            compute_reference_metric(
                &batch.indexes,
                &batch.preds,
                &batch.target,
                reference,
                config.empty_target_action,
                config.ignore_index,
            )
        };

        let value = if ddp {
            let synced = evaluate_sharded::<f64, U::Query>(config, &inputs.batches, NUM_PROCESSES)
                .unwrap_or_else(|e| panic!("{context}: sharded evaluation failed: {e}"));
            synced
                .compute()
                .unwrap_or_else(|e| panic!("{context}: compute failed: {e}"))
        } else {
            let mut metric = RetrievalMetric::<f64, U::Query>::new(config);
            for (i, batch) in inputs.batches.iter().enumerate() {
                let batch_value = metric
                    .forward(&batch.indexes, &batch.preds, &batch.target)
                    .unwrap_or_else(|e| panic!("{context}: forward on batch {i} failed: {e}"));
                assert_close(
                    batch_value,
                    reference_over(batch),
                    self.atol,
                    &format!("{context}, batch {i}"),
                );
            }
            metric
                .compute()
                .unwrap_or_else(|e| panic!("{context}: compute failed: {e}"))
        };

        assert_close(value, reference_over(&inputs.flattened()), self.atol, &context);
    }

    /// Functional metric vs the per-query reference, one batch at a time.
    pub fn run_functional_metric_test<U: MetricUnderTest>(
        &self,
        inputs: &RetrievalInputs,
        reference: ReferenceFn,
    ) {
        for (i, batch) in inputs.batches.iter().enumerate() {
            let context = format!("{}, batch {i}", inputs.name);
            let value = U::functional(&batch.preds, &batch.target)
                .unwrap_or_else(|e| panic!("{context}: functional metric failed: {e}"));
            assert_close(value, reference(&batch.target, &batch.preds), self.atol, &context);
        }
    }

    pub fn run_precision_test_cpu<U: MetricUnderTest>(&self, inputs: &RetrievalInputs) {
        self.run_precision_test::<U>(Device::Cpu, inputs);
    }

    pub fn run_precision_test_gpu<U: MetricUnderTest>(&self, inputs: &RetrievalInputs) {
        self.run_precision_test::<U>(Device::Gpu, inputs);
    }

    /// The same values, quantized to `f16` first, run at `f16`, `f32`, and `f64`.
    ///
    /// Quantizing up front keeps the ranking identical across precisions, so the only
    /// difference left is the precision of the returned value.
    pub fn run_precision_test<U: MetricUnderTest>(&self, device: Device, inputs: &RetrievalInputs) {
        if !device.is_available() {
            tracing::warn!(?device, fixture = inputs.name, "Device unavailable, skipping precision test");
            return;
        }

        let full: Vec<RetrievalBatch<f64>> = inputs
            .batches
            .iter()
            .map(|b| b.cast::<f16>().cast::<f64>())
            .collect();
        let config = MetricConfig::default();
        let expected = class_value::<f64, U>(config, &full, inputs.name);

        check_precision::<f16, U>(config, &full, expected, inputs.name);
        check_precision::<f32, U>(config, &full, expected, inputs.name);
    }

    /// Construction, update, and compute must fail with an error containing `message`.
    pub fn run_metric_class_arguments_test<U: MetricUnderTest>(
        &self,
        empty_target_action: &str,
        ignore_index: Option<i64>,
        batch: &RetrievalBatch<f64>,
        message: &str,
    ) {
        let result = class_metric_chain::<U::Query>(empty_target_action, ignore_index, batch);
        assert_error_message(
            result,
            message,
            &format!("class metric (empty_target_action={empty_target_action:?})"),
        );
    }

    /// The functional metric must fail with an error containing `message`.
    pub fn run_functional_metric_arguments_test<U: MetricUnderTest>(
        &self,
        preds: &[f64],
        target: &[i64],
        message: &str,
    ) {
        assert_error_message(U::functional(preds, target), message, "functional metric");
    }
}

fn class_value<T: Score, U: MetricUnderTest>(
    config: MetricConfig,
    batches: &[RetrievalBatch<f64>],
    name: &str,
) -> f64 {
    let mut metric = RetrievalMetric::<T, U::Query>::new(config);
    for batch in batches {
        let batch = batch.cast::<T>();
        metric
            .update(&batch.indexes, &batch.preds, &batch.target)
            .unwrap_or_else(|e| panic!("{name} ({}): update failed: {e}", T::DTYPE));
    }
    metric
        .compute()
        .unwrap_or_else(|e| panic!("{name} ({}): compute failed: {e}", T::DTYPE))
        .to_f64()
}

fn check_precision<T: Score, U: MetricUnderTest>(
    config: MetricConfig,
    full: &[RetrievalBatch<f64>],
    expected: f64,
    name: &str,
) {
    let context = format!("{name} ({})", T::DTYPE);
    let value = class_value::<T, U>(config, full, name);
    assert_close(value, expected, T::TOLERANCE, &context);

    for (i, batch) in full.iter().enumerate() {
        let reduced = batch.cast::<T>();
        let value = U::functional(&reduced.preds, &reduced.target)
            .unwrap_or_else(|e| panic!("{context}, batch {i}: functional metric failed: {e}"));
        let expected = U::functional(&batch.preds, &batch.target)
            .unwrap_or_else(|e| panic!("{context}, batch {i}: functional metric failed: {e}"));
        assert_close(
            value.to_f64(),
            expected,
            T::TOLERANCE,
            &format!("{context}, functional batch {i}"),
        );
    }
}
