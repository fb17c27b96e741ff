//! Recall@k over per-query evaluations.

use std::collections::BTreeSet;

/// Outcome of one query against one (index, model) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEvaluation {
    pub query_id: String,
    pub truth: BTreeSet<String>,
    /// Labels of the returned hits, best first.
    pub ranked_labels: Vec<String>,
}

impl QueryEvaluation {
    pub fn new(
        query_id: impl Into<String>,
        truth: BTreeSet<String>,
        ranked_labels: Vec<String>,
    ) -> Self {
        Self {
            query_id: query_id.into(),
            truth,
            ranked_labels,
        }
    }

    /// Whether any of the first `k` labels is relevant.
    pub fn hit_at(&self, k: usize) -> bool {
        self.ranked_labels
            .iter()
            .take(k)
            .any(|label| self.truth.contains(label))
    }
}

/// Fraction of evaluations with a relevant label in the top `k`.
///
/// Returns 0.0 for an empty slice.
pub fn recall_at_k(evaluations: &[QueryEvaluation], k: usize) -> f64 {
    if evaluations.is_empty() {
        return 0.0;
    }
    let hits = evaluations.iter().filter(|e| e.hit_at(k)).count();
    hits as f64 / evaluations.len() as f64
}

/// Recall per k, keyed in the order the ks were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecallTable {
    entries: Vec<(usize, f64)>,
}

impl RecallTable {
    /// Set the value for `k`, replacing any previous one.
    pub fn insert(&mut self, k: usize, value: f64) {
        match self.entries.iter_mut().find(|(key, _)| *key == k) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((k, value)),
        }
    }

    pub fn get(&self, k: usize) -> Option<f64> {
        self.entries
            .iter()
            .find(|(key, _)| *key == k)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this table with every value rounded to `digits` decimals.
    pub fn rounded(&self, digits: i32) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (*k, round_to(*v, digits)))
                .collect(),
        }
    }
}

impl FromIterator<(usize, f64)> for RecallTable {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        let mut table = RecallTable::default();
        for (k, value) in iter {
            table.insert(k, value);
        }
        table
    }
}

/// Recall@k for each requested k.
pub fn recall_table(evaluations: &[QueryEvaluation], k_list: &[usize]) -> RecallTable {
    k_list
        .iter()
        .map(|&k| (k, recall_at_k(evaluations, k)))
        .collect()
}

/// Round half away from zero to `digits` decimals.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
