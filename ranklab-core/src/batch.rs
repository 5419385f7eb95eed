//! Owned `(indexes, preds, target)` triples.

use crate::precision::Score;
use std::collections::BTreeMap;

/// A flat batch of retrieved items, each tagged with the query it belongs to.
///
/// The stateful metrics also use this as their accumulated state.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalBatch<T> {
    pub indexes: Vec<i64>,
    pub preds: Vec<T>,
    pub target: Vec<i64>,
}

impl<T> Default for RetrievalBatch<T> {
    fn default() -> Self {
        Self {
            indexes: Vec::new(),
            preds: Vec::new(),
            target: Vec::new(),
        }
    }
}

/// One query's items, in the order they were accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGroup<T> {
    pub index: i64,
    pub preds: Vec<T>,
    pub target: Vec<i64>,
}

impl<T> QueryGroup<T> {
    pub fn has_positive(&self) -> bool {
        self.target.iter().any(|&t| t != 0)
    }
}

impl<T: Score> RetrievalBatch<T> {
    pub fn new(indexes: Vec<i64>, preds: Vec<T>, target: Vec<i64>) -> Self {
        Self {
            indexes,
            preds,
            target,
        }
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn extend(&mut self, other: RetrievalBatch<T>) {
        self.indexes.extend(other.indexes);
        self.preds.extend(other.preds);
        self.target.extend(other.target);
    }

    /// Split into query groups, ascending by index. Item order inside a group is kept.
    pub fn groups(&self) -> Vec<QueryGroup<T>> {
        let mut by_index: BTreeMap<i64, QueryGroup<T>> = BTreeMap::new();
        for ((&index, &pred), &target) in self
            .indexes
            .iter()
            .zip(self.preds.iter())
            .zip(self.target.iter())
        {
            let group = by_index.entry(index).or_insert_with(|| QueryGroup {
                index,
                preds: Vec::new(),
                target: Vec::new(),
            });
            group.preds.push(pred);
            group.target.push(target);
        }
        by_index.into_values().collect()
    }

    /// Same items in another score precision.
    pub fn cast<U: Score>(&self) -> RetrievalBatch<U> {
        RetrievalBatch {
            indexes: self.indexes.clone(),
            preds: crate::precision::cast_scores(&self.preds),
            target: self.target.clone(),
        }
    }
}
