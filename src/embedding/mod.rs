//! Embedding providers.
//!
//! Provides the deterministic `local_hash` scheme and the `http_or_local`
//! provider, which calls a remote embedding service when a base URL is
//! configured and falls back to local hashing otherwise.

mod client;
mod hash;

pub use client::EmbeddingClient;
pub use hash::local_hash_embed;

use crate::config::EmbeddingConfig;
use crate::error::{BenchError, Result};
use std::time::Duration;

/// Known embedding providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    LocalHash,
    HttpOrLocal,
}

impl ProviderKind {
    /// Parse a provider name (case-insensitive).
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "local_hash" => Ok(ProviderKind::LocalHash),
            "http_or_local" => Ok(ProviderKind::HttpOrLocal),
            _ => Err(BenchError::Config(format!(
                "Unknown embedding provider: {}",
                name
            ))),
        }
    }
}

/// Scale a vector to unit L2 norm.
///
/// A vector whose sum of squares is not positive is returned as is.
pub fn l2_normalize(vec: Vec<f64>) -> Vec<f64> {
    let sum: f64 = vec.iter().map(|x| x * x).sum();
    if sum <= 0.0 {
        return vec;
    }
    let norm = sum.sqrt();
    vec.into_iter().map(|x| x / norm).collect()
}

/// Turns text into fixed-length unit vectors.
pub struct Embedder {
    config: EmbeddingConfig,
    client: Option<EmbeddingClient>,
}

impl Embedder {
    /// Create an embedder. The provider name is checked on each `embed` call.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = match &config.base_url {
            Some(base_url) => Some(EmbeddingClient::new(
                base_url,
                &config.endpoint_path,
                config.dim,
                Duration::from_secs(config.timeout_sec),
            )?),
            None => None,
        };

        Ok(Self { config, client })
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.config.dim
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        match ProviderKind::parse(&self.config.provider)? {
            ProviderKind::LocalHash => Ok(self.embed_local(text)),
            ProviderKind::HttpOrLocal => match &self.client {
                Some(client) => client.embed(text).await,
                None => Ok(self.embed_local(text)),
            },
        }
    }

    fn embed_local(&self, text: &str) -> Vec<f64> {
        local_hash_embed(text, self.config.dim, &self.config.salt)
    }
}
