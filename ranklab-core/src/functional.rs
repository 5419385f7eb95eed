//! Single-query retrieval metrics.

use crate::checks::check_functional_inputs;
use crate::error::MetricError;
use crate::precision::Score;

/// Reciprocal rank of already-validated inputs, in `f64`.
///
/// With `m` the top score held by a relevant item, the result is the number of
/// relevant items scored `m` over the number of items scored at least `m`. Tied
/// items share a rank, so the value does not depend on input order.
pub(crate) fn reciprocal_rank_f64<T: Score>(preds: &[T], target: &[i64]) -> f64 {
    let Some(top) = preds
        .iter()
        .zip(target)
        .filter(|&(_, &t)| t != 0)
        .map(|(p, _)| p.to_f64())
        .max_by(f64::total_cmp)
    else {
        return 0.0;
    };

    let at_or_above = preds.iter().filter(|p| p.to_f64() >= top).count();
    let relevant_at_top = preds
        .iter()
        .zip(target)
        .filter(|&(p, &t)| t != 0 && p.to_f64() == top)
        .count();
    relevant_at_top as f64 / at_or_above as f64
}

/// Reciprocal rank of one query: `1 / rank` of the highest-scored relevant item,
/// or `0` when no item is relevant. Tied scores share a rank.
///
/// ```
/// use ranklab_core::functional::retrieval_reciprocal_rank;
///
/// let rr = retrieval_reciprocal_rank(&[0.1_f64, 0.2, 0.3, 0.05], &[0, 0, 1, 0]).unwrap();
/// assert_eq!(rr, 1.0);
/// ```
pub fn retrieval_reciprocal_rank<T: Score>(preds: &[T], target: &[i64]) -> Result<T, MetricError> {
    check_functional_inputs(preds, target)?;
    Ok(T::from_f64(reciprocal_rank_f64(preds, target)))
}
