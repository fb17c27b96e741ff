//! A/B comparison of the two named models per index.
//!
//! Only indices where both "A" and "B" finished without error are compared;
//! anything else is skipped silently.

use crate::dataset::Record;
use crate::evaluator::SummaryRow;
use crate::metrics::round_to;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Name of the first model under comparison.
pub const MODEL_A: &str = "A";

/// Name of the second model under comparison.
pub const MODEL_B: &str = "B";

/// Decimals kept for deltas.
pub const DELTA_DIGITS: i32 = 4;

/// Which model won an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    A,
    B,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::A => write!(f, "A"),
            Winner::B => write!(f, "B"),
        }
    }
}

/// Decide the winner: higher recall@1, then recall@3 with ties going to A.
///
/// This is a deterministic tie-break, not a significance test.
pub fn pick_winner(a: &SummaryRow, b: &SummaryRow) -> Winner {
    let (a1, b1) = (a.recall_at(1), b.recall_at(1));
    if a1 > b1 {
        Winner::A
    } else if b1 > a1 {
        Winner::B
    } else if a.recall_at(3) >= b.recall_at(3) {
        Winner::A
    } else {
        Winner::B
    }
}

/// Delta header used in reports.
pub fn delta_key(k: usize) -> String {
    format!("delta@{} (A-B)", k)
}

/// A vs B for one index.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub index: String,
    /// `round(recall_A@k - recall_B@k, 4)` per configured k.
    pub deltas: Vec<(usize, f64)>,
    pub winner: Winner,
}

impl ComparisonRow {
    /// Build the row for one A/B pair.
    pub fn from_pair(index: &str, a: &SummaryRow, b: &SummaryRow, k_list: &[usize]) -> Self {
        let deltas = k_list
            .iter()
            .map(|&k| (k, round_to(a.recall_at(k) - b.recall_at(k), DELTA_DIGITS)))
            .collect();

        Self {
            index: index.to_string(),
            deltas,
            winner: pick_winner(a, b),
        }
    }

    pub fn delta(&self, k: usize) -> Option<f64> {
        self.deltas.iter().find(|(key, _)| *key == k).map(|(_, d)| *d)
    }

    /// Flatten into a report record.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("index".into(), Value::from(self.index.clone()));
        for (k, delta) in &self.deltas {
            record.insert(delta_key(*k), Value::from(*delta));
        }
        record.insert("winner".into(), Value::from(self.winner.to_string()));
        record
    }
}

/// Compare A and B on every index where both succeeded.
///
/// Indices appear in the order they first occur in `summary`. When a model
/// has several rows for one index, the last one counts.
pub fn compare_models(summary: &[SummaryRow], k_list: &[usize]) -> Vec<ComparisonRow> {
    let mut by_index: Vec<(&str, Option<&SummaryRow>, Option<&SummaryRow>)> = Vec::new();

    for row in summary {
        let slot = match by_index.iter().position(|(name, _, _)| *name == row.index) {
            Some(pos) => pos,
            None => {
                by_index.push((row.index.as_str(), None, None));
                by_index.len() - 1
            }
        };
        match row.model.as_str() {
            MODEL_A => by_index[slot].1 = Some(row),
            MODEL_B => by_index[slot].2 = Some(row),
            _ => {}
        }
    }

    by_index
        .into_iter()
        .filter_map(|(index, a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_success() && b.is_success() => {
                Some(ComparisonRow::from_pair(index, a, b, k_list))
            }
            _ => None,
        })
        .collect()
}

/// How many indices each model won.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinnerCounts {
    pub compared: usize,
    pub a: usize,
    pub b: usize,
}

impl WinnerCounts {
    pub fn tally(rows: &[ComparisonRow]) -> Self {
        rows.iter().fold(
            WinnerCounts {
                compared: rows.len(),
                ..Default::default()
            },
            |mut counts, row| {
                match row.winner {
                    Winner::A => counts.a += 1,
                    Winner::B => counts.b += 1,
                }
                counts
            },
        )
    }
}

/// Largest improvements and regressions of A over B at `k`.
///
/// `best` is ordered from the largest delta down, `worst` from the smallest
/// up. Rows without a delta at `k` are ignored.
pub fn top_deltas(rows: &[ComparisonRow], k: usize, n: usize) -> (Vec<&ComparisonRow>, Vec<&ComparisonRow>) {
    let mut valid: Vec<(&ComparisonRow, f64)> = rows
        .iter()
        .filter_map(|row| row.delta(k).map(|d| (row, d)))
        .collect();
    valid.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let best = valid.iter().take(n).map(|(row, _)| *row).collect();
    let worst = valid.iter().rev().take(n).map(|(row, _)| *row).collect();
    (best, worst)
}
