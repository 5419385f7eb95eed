use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ranklab_core::distributed::evaluate_sharded;
use ranklab_core::{MetricConfig, ReciprocalRank, RetrievalBatch, RetrievalMrr};

/// Deterministic pseudo-random scores without pulling in an RNG.
fn synthetic_batches(num_batches: usize, batch_size: usize) -> Vec<RetrievalBatch<f32>> {
    (0..num_batches)
        .map(|b| {
            let indexes = (0..batch_size).map(|i| ((b * batch_size + i) % 64) as i64).collect();
            let preds = (0..batch_size)
                .map(|i| ((b * 7919 + i * 104_729) % 10_007) as f32 / 10_007.0)
                .collect();
            let target = (0..batch_size).map(|i| ((b + i) % 5 == 0) as i64).collect();
            RetrievalBatch::new(indexes, preds, target)
        })
        .collect()
}

fn bench_compute(c: &mut Criterion) {
    let batches = synthetic_batches(100, 256);
    let config = MetricConfig::default();

    c.bench_function("mrr_update_compute_25k_items", |b| {
        b.iter(|| {
            let mut metric = RetrievalMrr::<f32>::new(config);
            for batch in &batches {
                metric
                    .update(&batch.indexes, &batch.preds, &batch.target)
                    .unwrap();
            }
            black_box(metric.compute().unwrap())
        })
    });

    c.bench_function("mrr_sharded_4_workers", |b| {
        b.iter(|| {
            let synced =
                evaluate_sharded::<f32, ReciprocalRank>(config, black_box(&batches), 4).unwrap();
            black_box(synced.compute().unwrap())
        })
    });
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
