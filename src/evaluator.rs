//! Per-(index, model) evaluation loop.
//!
//! For every query: embed the question, search, keep the ranked labels.
//! The first failing query aborts the whole run; there is no per-query
//! error recovery.

use crate::config::ModelConfig;
use crate::dataset::{QueryRecord, Record};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::metrics::{QueryEvaluation, RecallTable, recall_table, round_to};
use crate::search::{SearchBackend, SearchHit};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Decimals kept for recall values in summary rows.
pub const RECALL_DIGITS: i32 = 4;

/// Decimals kept for hit scores in detail rows.
pub const SCORE_DIGITS: i32 = 6;

/// Rank-by-rank view of one query, for reporting only.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub query_id: String,
    pub question: String,
    pub truth: BTreeSet<String>,
    pub hits: Vec<SearchHit>,
    /// `hit@k` for each configured k.
    pub hit_at: Vec<(usize, bool)>,
}

impl DetailRow {
    /// Flatten into a report record.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("query_id".into(), Value::from(self.query_id.clone()));
        record.insert("question".into(), Value::from(self.question.clone()));
        record.insert(
            "truth".into(),
            Value::from(self.truth.iter().cloned().collect::<Vec<_>>().join(",")),
        );
        for (i, hit) in self.hits.iter().enumerate() {
            record.insert(format!("rank_{}_label", i + 1), Value::from(hit.label.clone()));
            record.insert(
                format!("rank_{}_score", i + 1),
                Value::from(round_to(hit.score, SCORE_DIGITS)),
            );
        }
        for (k, hit) in &self.hit_at {
            record.insert(format!("hit@{}", k), Value::from(*hit));
        }
        record
    }
}

/// Everything one successful (index, model) run produced.
#[derive(Debug, Clone, Default)]
pub struct ModelRun {
    pub evaluations: Vec<QueryEvaluation>,
    pub details: Vec<DetailRow>,
}

impl ModelRun {
    /// Summary row with recall rounded to [`RECALL_DIGITS`].
    pub fn summarize(&self, index: &str, model: &str, k_list: &[usize]) -> SummaryRow {
        SummaryRow {
            index: index.to_string(),
            model: model.to_string(),
            queries: self.evaluations.len(),
            recall: recall_table(&self.evaluations, k_list).rounded(RECALL_DIGITS),
            error: None,
        }
    }
}

/// One line of the run summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub index: String,
    pub model: String,
    pub queries: usize,
    pub recall: RecallTable,
    /// Set when the run failed; `queries` is then 0.
    pub error: Option<String>,
}

impl SummaryRow {
    /// Row recording a failed run.
    pub fn failed(index: &str, model: &str, error: impl Into<String>) -> Self {
        Self {
            index: index.to_string(),
            model: model.to_string(),
            queries: 0,
            recall: RecallTable::default(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Recall@k, 0.0 when not recorded.
    pub fn recall_at(&self, k: usize) -> f64 {
        self.recall.get(k).unwrap_or(0.0)
    }

    /// Flatten into a report record.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("index".into(), Value::from(self.index.clone()));
        record.insert("model".into(), Value::from(self.model.clone()));
        record.insert("queries".into(), Value::from(self.queries));
        for (k, value) in self.recall.iter() {
            record.insert(format!("recall@{}", k), Value::from(value));
        }
        if let Some(error) = &self.error {
            record.insert("error".into(), Value::from(error.clone()));
        }
        record
    }
}

/// Drives one model over one backend.
pub struct Evaluator<'a> {
    backend: &'a dyn SearchBackend,
    embedder: Embedder,
    model: String,
    topn: usize,
    k_list: &'a [usize],
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator with the model's query embedder.
    pub fn new(
        backend: &'a dyn SearchBackend,
        model: &ModelConfig,
        topn: usize,
        k_list: &'a [usize],
    ) -> Result<Self> {
        Ok(Self {
            backend,
            embedder: Embedder::new(model.query_embedding.clone())?,
            model: model.name.clone(),
            topn,
            k_list,
        })
    }

    /// Evaluate a single query.
    pub async fn evaluate_query(&self, query: &QueryRecord) -> Result<(QueryEvaluation, DetailRow)> {
        let query_vector = self.embedder.embed(&query.question).await?;
        let mut hits = self.backend.search(&query_vector, self.topn).await?;
        hits.truncate(self.topn);

        let ranked_labels: Vec<String> = hits.iter().map(|h| h.label.clone()).collect();
        let evaluation =
            QueryEvaluation::new(query.query_id.clone(), query.truth.clone(), ranked_labels);

        let detail = DetailRow {
            query_id: query.query_id.clone(),
            question: query.question.clone(),
            truth: query.truth.clone(),
            hit_at: self.k_list.iter().map(|&k| (k, evaluation.hit_at(k))).collect(),
            hits,
        };

        Ok((evaluation, detail))
    }

    /// Evaluate every query in order, stopping at the first error.
    pub async fn run(&self, queries: &[QueryRecord]) -> Result<ModelRun> {
        let mut run = ModelRun::default();

        for query in queries {
            let (evaluation, detail) = self.evaluate_query(query).await?;
            debug!(
                index = self.backend.index_name(),
                model = %self.model,
                query_id = %evaluation.query_id,
                hit_at_1 = evaluation.hit_at(1),
                "evaluated query"
            );
            run.evaluations.push(evaluation);
            run.details.push(detail);
        }

        Ok(run)
    }
}
