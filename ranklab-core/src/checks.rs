//! Input validation shared by the functional and stateful metrics.

use crate::batch::RetrievalBatch;
use crate::error::MetricError;
use crate::precision::Score;

fn check_binary(target: &[i64]) -> Result<(), MetricError> {
    if target.iter().any(|&t| t != 0 && t != 1) {
        return Err(MetricError::NonBinaryTarget);
    }
    Ok(())
}

/// Validate a single query's `preds` and `target`.
pub fn check_functional_inputs<T: Score>(preds: &[T], target: &[i64]) -> Result<(), MetricError> {
    if preds.len() != target.len() {
        return Err(MetricError::functional_shape());
    }
    if preds.is_empty() {
        return Err(MetricError::functional_empty());
    }
    check_binary(target)
}

/// Validate a batch for the stateful metrics and drop items whose target equals
/// `ignore_index`. The binary check runs on what remains.
pub fn check_retrieval_inputs<T: Score>(
    indexes: &[i64],
    preds: &[T],
    target: &[i64],
    ignore_index: Option<i64>,
) -> Result<RetrievalBatch<T>, MetricError> {
    if indexes.len() != preds.len() || preds.len() != target.len() {
        return Err(MetricError::retrieval_shape());
    }
    if indexes.is_empty() {
        return Err(MetricError::retrieval_empty());
    }

    let batch = match ignore_index {
        Some(ignored) => {
            let mut kept = RetrievalBatch::default();
            for ((&index, &pred), &t) in indexes.iter().zip(preds).zip(target) {
                if t != ignored {
                    kept.indexes.push(index);
                    kept.preds.push(pred);
                    kept.target.push(t);
                }
            }
            kept
        }
        None => RetrievalBatch::new(indexes.to_vec(), preds.to_vec(), target.to_vec()),
    };

    check_binary(&batch.target)?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functional_shape_mismatch() {
        let err = check_functional_inputs(&[0.1_f64, 0.2], &[1]).unwrap_err();
        assert!(matches!(err, MetricError::ShapeMismatch(_)));
    }

    #[test]
    fn test_functional_empty() {
        let err = check_functional_inputs::<f32>(&[], &[]).unwrap_err();
        assert_eq!(err.to_string(), "`preds` and `target` must be non-empty");
    }

    #[test]
    fn test_non_binary_rejected() {
        let err = check_functional_inputs(&[0.1_f64, 0.2], &[0, 2]).unwrap_err();
        assert!(matches!(err, MetricError::NonBinaryTarget));
    }

    #[test]
    fn test_ignore_index_filters_before_binary_check() {
        let batch =
            check_retrieval_inputs(&[0, 0, 1], &[0.3_f64, 0.2, 0.1], &[-100, 1, 0], Some(-100))
                .unwrap();
        assert_eq!(batch.indexes, vec![0, 1]);
        assert_eq!(batch.preds, vec![0.2, 0.1]);
        assert_eq!(batch.target, vec![1, 0]);

        let err = check_retrieval_inputs(&[0, 0], &[0.3_f64, 0.2], &[-100, 1], None).unwrap_err();
        assert!(matches!(err, MetricError::NonBinaryTarget));
    }

    #[test]
    fn test_retrieval_shape_mismatch() {
        let err = check_retrieval_inputs(&[0, 0], &[0.3_f64], &[1], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`indexes`, `preds` and `target` must be of the same shape"
        );
    }

    #[test]
    fn test_everything_ignored_yields_empty_batch() {
        let batch = check_retrieval_inputs(&[0, 1], &[0.3_f64, 0.2], &[1, 1], Some(1)).unwrap();
        assert!(batch.is_empty());
    }
}
