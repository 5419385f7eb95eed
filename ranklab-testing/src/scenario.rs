//! Table-driven scenarios.
//!
//! A [`Scenario`] names its inputs, the metric arguments, how the metric is driven, and
//! the expected outcome. [`run_scenario`] dispatches one record to the matching
//! [`RetrievalMetricTester`] method.

use crate::fixtures::RetrievalInputs;
use crate::reference::ReferenceFn;
use crate::tester::{Device, MetricUnderTest, RetrievalMetricTester};
use ranklab_core::{MetricConfig, RetrievalBatch};

/// Metric arguments as a user would pass them, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricArgs {
    pub empty_target_action: &'static str,
    pub ignore_index: Option<i64>,
}

impl MetricArgs {
    pub fn new(empty_target_action: &'static str, ignore_index: Option<i64>) -> Self {
        Self {
            empty_target_action,
            ignore_index,
        }
    }
}

impl Default for MetricArgs {
    fn default() -> Self {
        Self::new("neg", None)
    }
}

/// How the metric under test is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stateful metric; `ddp` shards the batches over simulated workers.
    Class { ddp: bool },
    Functional,
    Precision(Device),
}

#[derive(Debug, Clone)]
pub enum ScenarioInput {
    Fixture(&'static RetrievalInputs),
    Raw(RetrievalBatch<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// Matches the reference within the tester's tolerance.
    MatchesReference,
    /// Fails with an error whose message contains this text.
    Error(&'static str),
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub mode: Mode,
    pub input: ScenarioInput,
    pub args: MetricArgs,
    pub expected: Expected,
}

impl Scenario {
    pub fn matches_reference(
        mode: Mode,
        inputs: &'static RetrievalInputs,
        args: MetricArgs,
    ) -> Self {
        let name = match mode {
            Mode::Class { ddp } => format!(
                "class/{}/ddp={ddp}/{}/ignore={:?}",
                inputs.name, args.empty_target_action, args.ignore_index
            ),
            Mode::Functional => format!("functional/{}", inputs.name),
            Mode::Precision(device) => format!("precision/{device:?}/{}", inputs.name),
        };
        Self {
            name,
            mode,
            input: ScenarioInput::Fixture(inputs),
            args,
            expected: Expected::MatchesReference,
        }
    }

    pub fn fails_with(
        name: &str,
        mode: Mode,
        batch: RetrievalBatch<f64>,
        args: MetricArgs,
        message: &'static str,
    ) -> Self {
        Self {
            name: name.to_string(),
            mode,
            input: ScenarioInput::Raw(batch),
            args,
            expected: Expected::Error(message),
        }
    }
}

/// Run one scenario, panicking on any mismatch.
///
/// # Panics
///
/// Also when the record combines a mode, input, and expectation that no tester method
/// accepts, such as a precision run with an expected error.
pub fn run_scenario<U: MetricUnderTest>(
    tester: &RetrievalMetricTester,
    scenario: &Scenario,
    reference: ReferenceFn,
) {
    tracing::debug!(scenario = %scenario.name, "Running scenario");
    match (&scenario.mode, &scenario.input, &scenario.expected) {
        (Mode::Class { ddp }, ScenarioInput::Fixture(inputs), Expected::MatchesReference) => {
            let config = MetricConfig::from_args(
                scenario.args.empty_target_action,
                scenario.args.ignore_index,
            )
            .unwrap_or_else(|e| panic!("{}: invalid metric arguments: {e}", scenario.name));
            tester.run_class_metric_test::<U>(*ddp, inputs, config, reference);
        }
        (Mode::Functional, ScenarioInput::Fixture(inputs), Expected::MatchesReference) => {
            tester.run_functional_metric_test::<U>(inputs, reference);
        }
        (Mode::Precision(device), ScenarioInput::Fixture(inputs), Expected::MatchesReference) => {
            tester.run_precision_test::<U>(*device, inputs);
        }
        (Mode::Class { .. }, ScenarioInput::Raw(batch), Expected::Error(message)) => {
            tester.run_metric_class_arguments_test::<U>(
                scenario.args.empty_target_action,
                scenario.args.ignore_index,
                batch,
                message,
            );
        }
        (Mode::Functional, ScenarioInput::Raw(batch), Expected::Error(message)) => {
            tester.run_functional_metric_arguments_test::<U>(&batch.preds, &batch.target, message);
        }
        _ => panic!("{}: unsupported scenario combination", scenario.name),
    }
}

fn raw(indexes: Vec<i64>, preds: Vec<f64>, target: Vec<i64>) -> RetrievalBatch<f64> {
    RetrievalBatch::new(indexes, preds, target)
}

/// Invalid-argument cases every stateful retrieval metric must reject.
pub fn class_argument_error_scenarios() -> Vec<Scenario> {
    let class = Mode::Class { ddp: false };
    vec![
        Scenario::fails_with(
            "class/wrong_empty_target_action",
            class,
            raw(vec![0, 0], vec![0.2, 0.8], vec![0, 1]),
            MetricArgs::new("casual_argument", None),
            "Argument `empty_target_action` received a wrong value `casual_argument`",
        ),
        Scenario::fails_with(
            "class/invalid_value_names_allowed_set",
            class,
            raw(vec![0, 0], vec![0.2, 0.8], vec![0, 1]),
            MetricArgs::new("invalid_value", None),
            "expected one of `error`, `skip`, `neg`, `pos`",
        ),
        Scenario::fails_with(
            "class/shape_mismatch",
            class,
            raw(vec![0, 0, 1], vec![0.2, 0.8], vec![0, 1]),
            MetricArgs::default(),
            "`indexes`, `preds` and `target` must be of the same shape",
        ),
        Scenario::fails_with(
            "class/empty_inputs",
            class,
            raw(vec![], vec![], vec![]),
            MetricArgs::default(),
            "`indexes`, `preds` and `target` must be non-empty",
        ),
        Scenario::fails_with(
            "class/non_binary_target",
            class,
            raw(vec![0, 0, 1], vec![0.2, 0.8, 0.5], vec![0, 2, 1]),
            MetricArgs::default(),
            "`target` must contain `binary` values",
        ),
        Scenario::fails_with(
            "class/non_binary_target_not_ignored",
            class,
            raw(vec![0, 0, 1], vec![0.2, 0.8, 0.5], vec![-100, 1, 1]),
            MetricArgs::new("neg", Some(-1)),
            "`target` must contain `binary` values",
        ),
    ]
}

/// Queries without a positive target under the `error` policy.
pub fn class_no_positive_target_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::fails_with(
            "class/no_positive_target",
            Mode::Class { ddp: false },
            raw(vec![0, 0, 1, 1], vec![0.2, 0.8, 0.5, 0.1], vec![0, 0, 1, 0]),
            MetricArgs::new("error", None),
            "`compute` method was provided with a query with no positive target.",
        ),
        Scenario::fails_with(
            "class/no_positive_target_after_ignore",
            Mode::Class { ddp: false },
            raw(vec![0, 0], vec![0.2, 0.8], vec![1, 0]),
            MetricArgs::new("error", Some(1)),
            "`compute` method was provided with a query with no positive target.",
        ),
    ]
}

/// Invalid-argument cases every functional retrieval metric must reject.
pub fn functional_argument_error_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::fails_with(
            "functional/shape_mismatch",
            Mode::Functional,
            raw(vec![], vec![0.2, 0.8, 0.4], vec![0, 1]),
            MetricArgs::default(),
            "`preds` and `target` must be of the same shape",
        ),
        Scenario::fails_with(
            "functional/empty_inputs",
            Mode::Functional,
            raw(vec![], vec![], vec![]),
            MetricArgs::default(),
            "`preds` and `target` must be non-empty",
        ),
        Scenario::fails_with(
            "functional/non_binary_target",
            Mode::Functional,
            raw(vec![], vec![0.2, 0.8], vec![0, 3]),
            MetricArgs::default(),
            "`target` must contain `binary` values",
        ),
    ]
}
