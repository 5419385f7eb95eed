//! Subcommand handlers.

use crate::input::{RetrievalRecord, load_records, to_batches};
use anyhow::Context;
use half::f16;
use ranklab_core::distributed::evaluate_sharded;
use ranklab_core::{MetricConfig, RanklabConfig, ReciprocalRank, Score};
use serde::Serialize;
use std::path::Path;

/// Score precision requested on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    F16,
    #[default]
    F32,
    F64,
}

/// Result printed by `ranklab evaluate`.
#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub metric: &'static str,
    pub mrr: f64,
    pub queries: usize,
    pub items: usize,
    pub precision: &'static str,
    pub workers: usize,
    pub empty_target_action: String,
    pub ignore_index: Option<i64>,
}

fn evaluate_at<T: Score>(
    records: &[RetrievalRecord],
    config: MetricConfig,
    workers: usize,
) -> anyhow::Result<EvaluationReport> {
    // One batch per worker keeps every simulated rank busy.
    let batches = to_batches::<T>(records, workers);
    let synced = evaluate_sharded::<T, ReciprocalRank>(config, &batches, workers)?;
    let mrr = synced.compute()?.to_f64();

    Ok(EvaluationReport {
        metric: "mrr",
        mrr,
        queries: synced.num_queries(),
        items: synced.state().len(),
        precision: T::DTYPE,
        workers,
        empty_target_action: config.empty_target_action.to_string(),
        ignore_index: config.ignore_index,
    })
}

pub fn evaluate(
    path: &Path,
    config: &RanklabConfig,
    precision: Precision,
) -> anyhow::Result<EvaluationReport> {
    let records = load_records(path)?;
    if records.is_empty() {
        anyhow::bail!("{} contains no records", path.display());
    }

    let workers = config.distributed.world_size;
    let report = match precision {
        Precision::F16 => evaluate_at::<f16>(&records, config.metric, workers),
        Precision::F32 => evaluate_at::<f32>(&records, config.metric, workers),
        Precision::F64 => evaluate_at::<f64>(&records, config.metric, workers),
    }
    .with_context(|| format!("Failed to evaluate {}", path.display()))?;

    tracing::info!(
        mrr = report.mrr,
        queries = report.queries,
        items = report.items,
        "Evaluation complete"
    );
    Ok(report)
}

pub fn show_config(config: &RanklabConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranklab_core::EmptyTargetAction;

    fn write_run(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("run.jsonl");
        let lines = [
            r#"{"query": 0, "score": 0.9, "relevant": 1}"#,
            r#"{"query": 0, "score": 0.1, "relevant": 0}"#,
            r#"{"query": 1, "score": 0.8, "relevant": 0}"#,
            r#"{"query": 1, "score": 0.2, "relevant": 1}"#,
            r#"{"query": 2, "score": 0.4, "relevant": 0}"#,
            r#"{"query": 2, "score": 0.6, "relevant": -100}"#,
        ];
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_evaluate_with_ignore_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_run(dir.path());

        let mut config = RanklabConfig::default();
        config.metric = MetricConfig::new(EmptyTargetAction::Skip, Some(-100));
        config.distributed.world_size = 2;

        for precision in [Precision::F16, Precision::F32, Precision::F64] {
            let report = evaluate(&path, &config, precision).unwrap();
            assert!((report.mrr - 0.75).abs() < 1e-3, "{precision:?}: {}", report.mrr);
            assert_eq!(report.queries, 3);
            assert_eq!(report.items, 5);
            assert_eq!(report.workers, 2);
        }
    }

    #[test]
    fn test_evaluate_rejects_sentinel_without_ignore_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_run(dir.path());
        let err = evaluate(&path, &RanklabConfig::default(), Precision::F64).unwrap_err();
        assert!(format!("{err:#}").contains("`target` must contain `binary` values"));
    }

    #[test]
    fn test_evaluate_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(evaluate(&path, &RanklabConfig::default(), Precision::F32).is_err());
    }

    #[test]
    fn test_show_config_is_toml() {
        let text = show_config(&RanklabConfig::default()).unwrap();
        assert!(text.contains("[metric]"));
        assert!(text.contains("empty_target_action = \"neg\""));
    }
}
