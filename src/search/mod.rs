//! Search backends.
//!
//! Every backend answers the same question: given a query vector, which
//! documents rank highest? Callers only see the [`SearchBackend`] trait;
//! [`build_backend`] picks the implementation from the index config.

mod elasticsearch;
mod mock;

pub use elasticsearch::ElasticsearchBackend;
pub use mock::MockBackend;

use crate::config::IndexConfig;
use crate::error::{BenchError, Result};
use async_trait::async_trait;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Unique document identifier.
    pub doc_id: String,
    /// Value compared against the ground truth.
    pub label: String,
    /// Similarity score. Only comparable within one backend/model pair.
    pub score: f64,
}

/// Capability shared by all search backends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Name of the index this backend serves.
    fn index_name(&self) -> &str;

    /// Return at most `topn` hits for `query_vector`, best first.
    async fn search(&self, query_vector: &[f64], topn: usize) -> Result<Vec<SearchHit>>;
}

/// Supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Mock,
    Elasticsearch,
}

impl BackendKind {
    /// Parse a backend name (case-insensitive).
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "mock" => Ok(BackendKind::Mock),
            "elasticsearch" => Ok(BackendKind::Elasticsearch),
            _ => Err(BenchError::Config(format!("Unknown backend: {}", name))),
        }
    }
}

/// Construct the backend for an index.
///
/// The mock backend embeds its whole corpus here, so this may perform I/O
/// and remote embedding calls.
pub async fn build_backend(index: &IndexConfig) -> Result<Box<dyn SearchBackend>> {
    let backend: Box<dyn SearchBackend> = match BackendKind::parse(&index.backend) {
        Ok(BackendKind::Mock) => Box::new(MockBackend::build(index).await?),
        Ok(BackendKind::Elasticsearch) => Box::new(ElasticsearchBackend::new(index)?),
        Err(_) => {
            return Err(BenchError::Config(format!(
                "[{}] Unknown backend: {}",
                index.name, index.backend
            )));
        }
    };
    Ok(backend)
}
