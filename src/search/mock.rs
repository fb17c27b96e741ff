//! In-memory backend over a JSONL corpus.

use super::{SearchBackend, SearchHit};
use crate::config::{EmbeddingConfig, IndexConfig};
use crate::dataset::{Record, field_string, read_jsonl};
use crate::embedding::Embedder;
use crate::error::{BenchError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::debug;

/// Scores every stored document against the query by dot product.
///
/// Document vectors are built once at construction with the index's
/// document embedder. Both sides are unit vectors, so the dot product is
/// the cosine similarity.
pub struct MockBackend {
    name: String,
    id_field: String,
    label_field: String,
    documents: Vec<Record>,
    vectors: Vec<Vec<f64>>,
}

impl MockBackend {
    /// Load the corpus from `docs_path` and embed it.
    pub async fn build(index: &IndexConfig) -> Result<Self> {
        let docs_path = index.docs_path.as_ref().ok_or_else(|| {
            BenchError::Config(format!(
                "[{}] docs_path is required for mock backend",
                index.name
            ))
        })?;

        let documents = read_jsonl(docs_path)?;
        Self::from_documents(index, documents).await
    }

    /// Embed an already loaded corpus.
    ///
    /// Each document gets its vector attached under the index's vector field,
    /// the way a real index exposes a stored vector.
    pub async fn from_documents(index: &IndexConfig, mut documents: Vec<Record>) -> Result<Self> {
        let doc_vector = index
            .doc_vector
            .clone()
            .unwrap_or_else(EmbeddingConfig::default_doc_vector);
        let embedder = Embedder::new(doc_vector)?;

        let mut vectors = Vec::with_capacity(documents.len());
        for document in documents.iter_mut() {
            let text = field_string(document, &index.doc_text_field);
            let vector = embedder.embed(&text).await?;
            document.insert(
                index.vector_field.clone(),
                Value::Array(vector.iter().map(|x| Value::from(*x)).collect()),
            );
            vectors.push(vector);
        }

        debug!(
            index = %index.name,
            documents = documents.len(),
            dim = embedder.dim(),
            "embedded mock corpus"
        );

        Ok(Self {
            name: index.name.clone(),
            id_field: index.id_field.clone(),
            label_field: index.label_field.clone(),
            documents,
            vectors,
        })
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Documents with their vectors attached.
    pub fn documents(&self) -> &[Record] {
        &self.documents
    }

    /// Rank the whole corpus for `query_vector`.
    fn rank(&self, query_vector: &[f64]) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .zip(&self.vectors)
            .map(|(document, vector)| SearchHit {
                doc_id: field_string(document, &self.id_field),
                label: field_string(document, &self.label_field),
                score: dot(query_vector, vector),
            })
            .collect();

        // Stable: equal scores keep corpus order.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl SearchBackend for MockBackend {
    fn index_name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query_vector: &[f64], topn: usize) -> Result<Vec<SearchHit>> {
        let mut hits = self.rank(query_vector);
        hits.truncate(topn);
        Ok(hits)
    }
}
