//! Simulated data-parallel evaluation.
//!
//! Each rank owns a strided subset of the batches and accumulates them into its own
//! metric. The per-rank states are then gathered (concatenated in rank order) into one
//! metric, which is what every rank would compute after a real all-gather.

use crate::batch::RetrievalBatch;
use crate::config::MetricConfig;
use crate::error::MetricError;
use crate::metric::{QueryMetric, RetrievalMetric};
use crate::precision::Score;
use std::thread;

/// Position of one worker in a simulated process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub rank: usize,
    pub world_size: usize,
}

impl Shard {
    pub fn new(rank: usize, world_size: usize) -> Result<Self, MetricError> {
        if world_size == 0 {
            return Err(MetricError::config("world_size must be at least 1"));
        }
        if rank >= world_size {
            return Err(MetricError::config(format!(
                "rank {rank} is outside a world of size {world_size}"
            )));
        }
        Ok(Self { rank, world_size })
    }

    /// Batches `rank, rank + world_size, rank + 2 * world_size, ...` belong to this shard.
    pub fn owns(&self, batch: usize) -> bool {
        batch % self.world_size == self.rank
    }

    pub fn batches<'a, B>(self, batches: &'a [B]) -> impl Iterator<Item = &'a B> {
        batches
            .iter()
            .enumerate()
            .filter(move |(i, _)| self.owns(*i))
            .map(|(_, b)| b)
    }
}

/// Concatenate per-rank states in rank order.
pub fn all_gather<T: Score>(states: Vec<RetrievalBatch<T>>) -> RetrievalBatch<T> {
    let mut gathered = RetrievalBatch::default();
    for state in states {
        gathered.extend(state);
    }
    gathered
}

/// Accumulate the batches owned by `shard` into a fresh metric and return its state.
pub fn run_shard<T: Score, M: QueryMetric>(
    config: MetricConfig,
    shard: Shard,
    batches: &[RetrievalBatch<T>],
) -> Result<RetrievalBatch<T>, MetricError> {
    let mut metric = RetrievalMetric::<T, M>::new(config);
    for batch in shard.batches(batches) {
        metric.update(&batch.indexes, &batch.preds, &batch.target)?;
    }
    Ok(metric.take_state())
}

/// Evaluate `batches` across `world_size` simulated workers and return the synced metric.
///
/// Every rank runs on its own scoped thread.
pub fn evaluate_sharded<T: Score, M: QueryMetric>(
    config: MetricConfig,
    batches: &[RetrievalBatch<T>],
    world_size: usize,
) -> Result<RetrievalMetric<T, M>, MetricError> {
    let shards = (0..world_size)
        .map(|rank| Shard::new(rank, world_size))
        .collect::<Result<Vec<_>, _>>()?;
    if shards.is_empty() {
        return Err(MetricError::config("world_size must be at least 1"));
    }

    tracing::info!(
        metric = M::NAME,
        world_size,
        batches = batches.len(),
        "Running sharded evaluation"
    );

    let results: Vec<Result<RetrievalBatch<T>, MetricError>> = thread::scope(|scope| {
        let handles: Vec<_> = shards
            .iter()
            .map(|&shard| scope.spawn(move || run_shard::<T, M>(config, shard, batches)))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(MetricError::worker(format!("rank {rank} panicked"))))
            })
            .collect()
    });

    let states = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    let mut synced = RetrievalMetric::new(config);
    synced.merge_state(all_gather(states));
    Ok(synced)
}
