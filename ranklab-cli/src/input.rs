//! Loading retrieval runs from disk.
//!
//! Accepts either a JSON array of records or JSON lines (one record per line, blank
//! lines ignored).

use anyhow::Context;
use ranklab_core::{RetrievalBatch, Score};
use serde::Deserialize;
use std::path::Path;

/// One retrieved item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrievalRecord {
    /// Query the item was retrieved for.
    pub query: i64,
    /// Predicted relevance score.
    pub score: f64,
    /// Ground truth: 0, 1, or the configured ignore sentinel.
    pub relevant: i64,
}

pub fn parse_records(content: &str) -> anyhow::Result<Vec<RetrievalRecord>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).context("Invalid JSON array of records");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid record on line {}", i + 1))
        })
        .collect()
}

pub fn load_records(path: &Path) -> anyhow::Result<Vec<RetrievalRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records = parse_records(&content)?;
    tracing::debug!(path = %path.display(), records = records.len(), "Loaded records");
    Ok(records)
}

/// Split records into `num_batches` contiguous batches at the requested precision.
pub fn to_batches<T: Score>(records: &[RetrievalRecord], num_batches: usize) -> Vec<RetrievalBatch<T>> {
    let chunk = records.len().div_ceil(num_batches.max(1)).max(1);
    records
        .chunks(chunk)
        .map(|chunk| {
            RetrievalBatch::new(
                chunk.iter().map(|r| r.query).collect(),
                chunk.iter().map(|r| T::from_f64(r.score)).collect(),
                chunk.iter().map(|r| r.relevant).collect(),
            )
        })
        .collect()
}
