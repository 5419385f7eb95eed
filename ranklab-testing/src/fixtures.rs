//! Seeded input fixtures.
//!
//! Every fixture is generated lazily, once per process, from [`SEED`] plus a fixed
//! per-fixture offset, so the values do not depend on which fixture is touched first.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ranklab_core::RetrievalBatch;
use std::sync::LazyLock;

pub const SEED: u64 = 42;
pub const NUM_BATCHES: usize = 10;
pub const BATCH_SIZE: usize = 32;
/// Query indexes are drawn from `0..NUM_QUERIES`.
pub const NUM_QUERIES: i64 = 10;
pub const IGNORE_INDEX: i64 = -100;

/// A named list of batches fed to a metric one at a time.
#[derive(Debug, Clone)]
pub struct RetrievalInputs {
    pub name: &'static str,
    pub batches: Vec<RetrievalBatch<f64>>,
}

impl RetrievalInputs {
    /// All batches concatenated, in batch order.
    pub fn flattened(&self) -> RetrievalBatch<f64> {
        let mut all = RetrievalBatch::default();
        for batch in &self.batches {
            all.extend(batch.clone());
        }
        all
    }
}

fn rng(offset: u64) -> StdRng {
    StdRng::seed_from_u64(SEED.wrapping_add(offset))
}

/// Random batches with `P(target = 1) = relevant_prob`.
fn generate(
    name: &'static str,
    offset: u64,
    num_queries: i64,
    relevant_prob: f64,
    ignore_prob: f64,
) -> RetrievalInputs {
    let mut rng = rng(offset);
    let batches = (0..NUM_BATCHES)
        .map(|_| {
            let indexes = (0..BATCH_SIZE)
                .map(|_| rng.gen_range(0..num_queries))
                .collect();
            let preds = (0..BATCH_SIZE).map(|_| rng.r#gen::<f64>()).collect();
            let target = (0..BATCH_SIZE)
                .map(|_| {
                    if rng.gen_bool(ignore_prob) {
                        IGNORE_INDEX
                    } else {
                        i64::from(rng.gen_bool(relevant_prob))
                    }
                })
                .collect();
            RetrievalBatch::new(indexes, preds, target)
        })
        .collect();
    RetrievalInputs { name, batches }
}

static CLASS_INPUTS: LazyLock<Vec<RetrievalInputs>> = LazyLock::new(|| {
    vec![
        generate("random", 0, NUM_QUERIES, 0.5, 0.0),
        // Few positives, so some queries (and many per-batch groups) have none.
        generate("sparse_target", 1, NUM_QUERIES, 0.02, 0.0),
        generate("single_query", 2, 1, 0.5, 0.0),
    ]
});

static IGNORE_INDEX_INPUTS: LazyLock<Vec<RetrievalInputs>> = LazyLock::new(|| {
    vec![
        generate("random_ignore", 3, NUM_QUERIES, 0.5, 0.2),
        generate("sparse_target_ignore", 4, NUM_QUERIES, 0.02, 0.2),
    ]
});

static FUNCTIONAL_INPUTS: LazyLock<Vec<RetrievalInputs>> = LazyLock::new(|| {
    vec![
        generate("functional_random", 5, 1, 0.5, 0.0),
        generate("functional_sparse", 6, 1, 0.02, 0.0),
    ]
});

/// Binary targets, queries spread over [`NUM_QUERIES`] indexes.
pub fn class_inputs() -> &'static [RetrievalInputs] {
    &CLASS_INPUTS
}

/// Like [`class_inputs`] but about a fifth of the targets are [`IGNORE_INDEX`].
pub fn ignore_index_inputs() -> &'static [RetrievalInputs] {
    &IGNORE_INDEX_INPUTS
}

/// Each batch is one query.
pub fn functional_inputs() -> &'static [RetrievalInputs] {
    &FUNCTIONAL_INPUTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_shapes() {
        for inputs in class_inputs()
            .iter()
            .chain(ignore_index_inputs())
            .chain(functional_inputs())
        {
            assert_eq!(inputs.batches.len(), NUM_BATCHES, "{}", inputs.name);
            for batch in &inputs.batches {
                assert_eq!(batch.indexes.len(), BATCH_SIZE);
                assert_eq!(batch.preds.len(), BATCH_SIZE);
                assert_eq!(batch.target.len(), BATCH_SIZE);
                assert!(batch.preds.iter().all(|p| (0.0..1.0).contains(p)));
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate("a", 9, NUM_QUERIES, 0.5, 0.1);
        let b = generate("b", 9, NUM_QUERIES, 0.5, 0.1);
        assert_eq!(a.batches, b.batches);
    }

    #[test]
    fn test_ignore_fixture_contains_sentinel() {
        let flat = ignore_index_inputs()[0].flattened();
        assert!(flat.target.contains(&IGNORE_INDEX));
        assert!(flat.target.iter().all(|&t| t == 0 || t == 1 || t == IGNORE_INDEX));
    }

    #[test]
    fn test_sparse_fixture_has_empty_queries() {
        let flat = class_inputs()[1].flattened();
        assert!(flat.groups().iter().any(|g| !g.has_positive()));
    }
}
