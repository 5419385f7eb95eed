//! Reference scorers the production metrics are checked against.
//!
//! [`label_ranking_average_precision`] is the multi-label ranking score; it equals
//! reciprocal rank only when a row has exactly one positive label, so
//! [`reciprocal_rank`] first collapses the positives of a query down to the
//! highest-scored one(s).

use ranklab_core::EmptyTargetAction;
use std::collections::BTreeMap;

/// Reference for a single query: `(target, preds) -> value`.
pub type ReferenceFn = fn(&[i64], &[f64]) -> f64;

/// Label ranking average precision over a 2-D `(rows, labels)` input.
///
/// For every relevant label `j` of a row: the number of relevant labels scored at least
/// as high as `j`, divided by the number of labels scored at least as high as `j`.
/// Rows with no relevant label, or with every label relevant, score `1.0`.
///
/// # Panics
///
/// If `y_true` and `y_score` differ in shape, or there are no rows.
pub fn label_ranking_average_precision(y_true: &[Vec<i64>], y_score: &[Vec<f64>]) -> f64 {
    assert_eq!(y_true.len(), y_score.len(), "y_true and y_score row counts differ");
    assert!(!y_true.is_empty(), "at least one row is required");

    let mut total = 0.0;
    for (truth, scores) in y_true.iter().zip(y_score) {
        assert_eq!(truth.len(), scores.len(), "y_true and y_score row lengths differ");

        let relevant: Vec<usize> = (0..truth.len()).filter(|&j| truth[j] != 0).collect();
        if relevant.is_empty() || relevant.len() == truth.len() {
            total += 1.0;
            continue;
        }

        let row: f64 = relevant
            .iter()
            .map(|&j| {
                let rank = scores.iter().filter(|&&s| s >= scores[j]).count();
                let relevant_rank = relevant.iter().filter(|&&k| scores[k] >= scores[j]).count();
                relevant_rank as f64 / rank as f64
            })
            .sum();
        total += row / relevant.len() as f64;
    }
    total / y_true.len() as f64
}

/// Reciprocal rank of one query, via [`label_ranking_average_precision`].
///
/// Only the positives holding the highest score among positives are kept (all of them
/// on a tie), which is the one item reciprocal rank looks at. Works on a copy of
/// `target`; the caller's slice is left untouched.
///
/// # Panics
///
/// If `target` and `preds` differ in length.
pub fn reciprocal_rank(target: &[i64], preds: &[f64]) -> f64 {
    assert_eq!(target.len(), preds.len(), "target and preds must have the same shape");

    let mut target = target.to_vec();
    let best = target
        .iter()
        .zip(preds)
        .filter(|(t, _)| **t != 0)
        .map(|(_, &p)| p)
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))));

    if let Some(best) = best {
        for (t, &p) in target.iter_mut().zip(preds) {
            if p != best {
                *t = 0;
            }
        }
    }

    if target.iter().any(|&t| t != 0) {
        return label_ranking_average_precision(&[target], &[preds.to_vec()]);
    }
    0.0
}

/// Aggregate a per-query reference the way the stateful metric is expected to.
///
/// Items whose target equals `ignore_index` are dropped, the rest are grouped by index,
/// and queries without a positive follow `empty_target_action` (`skip` leaves them out,
/// `pos` counts 1, anything else counts 0). NaN values count as 0 and an empty result
/// is 0.
pub fn compute_reference_metric(
    indexes: &[i64],
    preds: &[f64],
    target: &[i64],
    reference: ReferenceFn,
    empty_target_action: EmptyTargetAction,
    ignore_index: Option<i64>,
) -> f64 {
    let mut groups: BTreeMap<i64, (Vec<i64>, Vec<f64>)> = BTreeMap::new();
    for ((&index, &pred), &t) in indexes.iter().zip(preds).zip(target) {
        if ignore_index == Some(t) {
            continue;
        }
        let group = groups.entry(index).or_default();
        group.0.push(t);
        group.1.push(pred);
    }

    let mut results = Vec::with_capacity(groups.len());
    for (trg, pds) in groups.values() {
        if trg.iter().sum::<i64>() == 0 {
            match empty_target_action {
                EmptyTargetAction::Skip => {}
                EmptyTargetAction::Pos => results.push(1.0),
                _ => results.push(0.0),
            }
        } else {
            results.push(reference(trg, pds));
        }
    }

    if results.is_empty() {
        return 0.0;
    }
    let sum: f64 = results.iter().map(|r| if r.is_nan() { 0.0 } else { *r }).sum();
    sum / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrap_single_positive_is_inverse_rank() {
        let score = label_ranking_average_precision(&[vec![0, 1, 0]], &[vec![0.9, 0.5, 0.1]]);
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lrap_multiple_positives() {
        // ranks of the positives: 1 and 3 -> (1/1 + 2/3) / 2
        let score =
            label_ranking_average_precision(&[vec![1, 0, 1, 0]], &[vec![0.9, 0.8, 0.7, 0.1]]);
        assert!((score - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_lrap_degenerate_rows() {
        assert_eq!(label_ranking_average_precision(&[vec![0, 0]], &[vec![0.2, 0.1]]), 1.0);
        assert_eq!(label_ranking_average_precision(&[vec![1, 1]], &[vec![0.2, 0.1]]), 1.0);
    }

    #[test]
    #[should_panic(expected = "row lengths differ")]
    fn test_lrap_shape_mismatch_panics() {
        label_ranking_average_precision(&[vec![0, 1]], &[vec![0.2]]);
    }

    #[test]
    fn test_reference_aggregation_policies() {
        let indexes = [0, 0, 1, 1, 2];
        let preds = [0.9, 0.1, 0.2, 0.8, 0.5];
        let target = [1, 0, 1, 0, 0];

        let skip = compute_reference_metric(
            &indexes,
            &preds,
            &target,
            reciprocal_rank,
            EmptyTargetAction::Skip,
            None,
        );
        assert!((skip - 0.75).abs() < 1e-12);

        let pos = compute_reference_metric(
            &indexes,
            &preds,
            &target,
            reciprocal_rank,
            EmptyTargetAction::Pos,
            None,
        );
        assert!((pos - 2.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_reference_drops_ignored_items() {
        let value = compute_reference_metric(
            &[0, 0, 0],
            &[0.9, 0.5, 0.1],
            &[-100, 0, 1],
            reciprocal_rank,
            EmptyTargetAction::Neg,
            Some(-100),
        );
        assert!((value - 0.5).abs() < 1e-12);
    }
}
