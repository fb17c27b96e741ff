//! HTTP client for a remote embedding service.
//!
//! The service accepts `POST <base_url><endpoint_path>` with a JSON body
//! `{"text": ..., "dim": ...}` and answers with `{"embedding": [...]}`.

use super::l2_normalize;
use crate::error::{BenchError, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Request body for an embedding call.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
    dim: usize,
}

/// Client for one embedding endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    url: String,
    dim: usize,
}

impl EmbeddingClient {
    /// Create a client for `base_url + endpoint_path` with a per-request timeout.
    pub fn new(base_url: &str, endpoint_path: &str, dim: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: Self::endpoint(base_url, endpoint_path),
            dim,
        })
    }

    fn endpoint(base_url: &str, endpoint_path: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), endpoint_path)
    }

    /// Fetch and normalize the embedding of `text`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let request = EmbedRequest {
            text,
            dim: self.dim,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BenchError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = serde_json::from_str(&body)
            .map_err(|e| BenchError::Validation(format!("Invalid response: {}", e)))?;

        let vector = parse_embedding(&data, self.dim)?;
        Ok(l2_normalize(vector))
    }
}

/// Extract the `embedding` field and check its length.
fn parse_embedding(data: &Value, dim: usize) -> Result<Vec<f64>> {
    let items = data
        .get("embedding")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            BenchError::Validation("Invalid response: 'embedding' must be a list".to_string())
        })?;

    if items.len() != dim {
        return Err(BenchError::Validation(format!(
            "Embedding dim mismatch: expected {}, got {}",
            dim,
            items.len()
        )));
    }

    items
        .iter()
        .map(|x| {
            x.as_f64().ok_or_else(|| {
                BenchError::Validation(format!("Invalid response: non-numeric component {}", x))
            })
        })
        .collect()
}
