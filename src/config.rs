//! Configuration for a benchmark run.
//!
//! A run is described by a YAML file listing the query set, the models to
//! compare and the indices to search. A few run-level settings can be
//! overridden from the environment; environment variables take precedence
//! over config file values.

use crate::error::{BenchError, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Default dimension of document vectors built by the mock backend.
pub const DEFAULT_DOC_VECTOR_DIM: usize = 32;

/// Default salt of document vectors built by the mock backend.
pub const DEFAULT_DOC_VECTOR_SALT: &str = "A";

/// Settings for one embedding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: `local_hash` or `http_or_local`.
    pub provider: String,

    /// Vector dimension.
    pub dim: usize,

    /// Salt mixed into the hash input.
    pub salt: String,

    /// Base URL of the embedding service. `None` means local hashing.
    pub base_url: Option<String>,

    /// Path appended to `base_url`.
    pub endpoint_path: String,

    /// Per-request timeout in seconds.
    pub timeout_sec: u64,
}

fn default_endpoint_path() -> String {
    "/embed".to_string()
}

fn default_embedding_timeout() -> u64 {
    15
}

fn default_search_timeout() -> u64 {
    30
}

impl EmbeddingConfig {
    /// A deterministic hash-based provider.
    pub fn local_hash(dim: usize, salt: impl Into<String>) -> Self {
        Self {
            provider: "local_hash".to_string(),
            dim,
            salt: salt.into(),
            base_url: None,
            endpoint_path: default_endpoint_path(),
            timeout_sec: default_embedding_timeout(),
        }
    }

    /// The embedder used for mock documents when an index does not set one.
    pub fn default_doc_vector() -> Self {
        Self::local_hash(DEFAULT_DOC_VECTOR_DIM, DEFAULT_DOC_VECTOR_SALT)
    }
}

/// A named model under comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub query_embedding: EmbeddingConfig,
}

/// One searchable corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub name: String,

    /// Backend kind: `mock` or `elasticsearch`.
    pub backend: String,

    pub vector_field: String,
    pub id_field: String,
    pub label_field: String,
    pub doc_text_field: String,

    /// JSONL documents (mock backend only).
    pub docs_path: Option<PathBuf>,

    /// Embedder for mock documents.
    pub doc_vector: Option<EmbeddingConfig>,

    pub es_url: Option<String>,
    pub es_index: Option<String>,
    pub es_auth_user: Option<String>,
    pub es_auth_pass: Option<String>,
    pub es_verify_tls: bool,
    pub es_use_knn: bool,
    pub es_timeout_sec: u64,
}

impl IndexConfig {
    /// Create an index config with default field names.
    pub fn new(
        name: impl Into<String>,
        backend: impl Into<String>,
        vector_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            backend: backend.into(),
            vector_field: vector_field.into(),
            id_field: "doc_id".to_string(),
            label_field: "answer_id".to_string(),
            doc_text_field: "question".to_string(),
            docs_path: None,
            doc_vector: None,
            es_url: None,
            es_index: None,
            es_auth_user: None,
            es_auth_pass: None,
            es_verify_tls: true,
            es_use_knn: true,
            es_timeout_sec: default_search_timeout(),
        }
    }
}

/// Run-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub output_root: PathBuf,
    pub k_list: Vec<usize>,
    pub topn: usize,
    pub fail_fast: bool,
}

/// Query set location.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub queries_path: PathBuf,
    /// Key holding the ground-truth labels of each query.
    pub truth_key: String,
}

/// Full benchmark configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub project_name: String,
    pub run: RunConfig,
    pub data: DataConfig,
    /// Models in file order.
    pub models: Vec<ModelConfig>,
    pub indices: Vec<IndexConfig>,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    project: Option<ProjectSection>,
    run: Option<RunSection>,
    data: Option<DataSection>,
    models: Option<serde_yaml::Mapping>,
    indices: Option<Vec<IndexSection>>,
}

#[derive(Debug, Deserialize)]
struct ProjectSection {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunSection {
    output_root: Option<String>,
    k_list: Option<Vec<usize>>,
    topn: Option<usize>,
    fail_fast: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DataSection {
    queries_path: Option<String>,
    truth_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelSection {
    query_embedding: Option<EmbeddingSection>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    dim: Option<usize>,
    salt: Option<String>,
    base_url: Option<String>,
    endpoint_path: Option<String>,
    timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct IndexSection {
    name: Option<String>,
    backend: Option<String>,
    vector_field: Option<String>,
    docs_path: Option<String>,
    id_field: Option<String>,
    label_field: Option<String>,
    doc_text_field: Option<String>,
    doc_vector: Option<EmbeddingSection>,
    es_url: Option<String>,
    es_index: Option<String>,
    es_auth_user: Option<String>,
    es_auth_pass: Option<String>,
    es_verify_tls: Option<bool>,
    es_use_knn: Option<bool>,
    es_timeout_sec: Option<u64>,
}

fn require<T>(value: Option<T>, key: &str, ctx: &str) -> Result<T> {
    value.ok_or_else(|| BenchError::Config(format!("Missing required key '{}' in {}", key, ctx)))
}

/// Treat blank strings the same as absent ones.
// Whitespace-only values count as blank too, so `base_url: " "` means local hashing.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl EmbeddingSection {
    fn into_config(self, ctx: &str) -> Result<EmbeddingConfig> {
        Ok(EmbeddingConfig {
            provider: require(self.provider, "provider", ctx)?,
            dim: require(self.dim, "dim", ctx)?,
            salt: self.salt.unwrap_or_default(),
            base_url: non_empty(self.base_url),
            endpoint_path: self.endpoint_path.unwrap_or_else(default_endpoint_path),
            timeout_sec: self.timeout_sec.unwrap_or_else(default_embedding_timeout),
        })
    }
}

impl IndexSection {
    fn into_config(self) -> Result<IndexConfig> {
        let label = self.name.clone().unwrap_or_else(|| "?".to_string());
        let ctx = format!("indices.{}", label);

        let name = require(self.name, "name", "indices[*]")?;
        let backend = require(self.backend, "backend", &ctx)?;
        let vector_field = require(self.vector_field, "vector_field", &ctx)?;

        let mut index = IndexConfig::new(name, backend, vector_field);
        if let Some(id_field) = self.id_field {
            index.id_field = id_field;
        }
        if let Some(label_field) = self.label_field {
            index.label_field = label_field;
        }
        if let Some(doc_text_field) = self.doc_text_field {
            index.doc_text_field = doc_text_field;
        }
        index.docs_path = non_empty(self.docs_path).map(PathBuf::from);
        index.doc_vector = self
            .doc_vector
            .map(|dv| dv.into_config(&format!("{}.doc_vector", ctx)))
            .transpose()?;
        index.es_url = non_empty(self.es_url);
        index.es_index = non_empty(self.es_index);
        index.es_auth_user = non_empty(self.es_auth_user);
        index.es_auth_pass = non_empty(self.es_auth_pass);
        index.es_verify_tls = self.es_verify_tls.unwrap_or(true);
        index.es_use_knn = self.es_use_knn.unwrap_or(true);
        index.es_timeout_sec = self.es_timeout_sec.unwrap_or_else(default_search_timeout);

        Ok(index)
    }
}

fn model_name(key: &serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(BenchError::Config(format!(
            "Model names must be strings, got {:?}",
            other
        ))),
    }
}

impl BenchConfig {
    /// Load configuration from a file and apply environment overrides.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (BENCH_OUTPUT_ROOT, BENCH_TOPN, BENCH_FAIL_FAST)
    /// 2. Config file
    /// 3. Default values
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| BenchError::Config(format!("Failed to parse config file: {}", e)))?;

        let project = require(file.project, "project", "root")?;
        let project_name = require(project.name, "name", "project")?;

        let run = require(file.run, "run", "root")?;
        let run = RunConfig {
            output_root: PathBuf::from(require(run.output_root, "output_root", "run")?),
            k_list: require(run.k_list, "k_list", "run")?,
            topn: run.topn.unwrap_or(10),
            fail_fast: run.fail_fast.unwrap_or(false),
        };

        let data = require(file.data, "data", "root")?;
        let data = DataConfig {
            queries_path: PathBuf::from(require(data.queries_path, "queries_path", "data")?),
            truth_key: data.truth_key.unwrap_or_else(|| "answer_ids".to_string()),
        };

        let mut models = Vec::new();
        for (key, value) in require(file.models, "models", "root")? {
            let name = model_name(&key)?;
            let ctx = format!("models.{}", name);
            let section: ModelSection = serde_yaml::from_value(value)
                .map_err(|e| BenchError::Config(format!("Invalid {}: {}", ctx, e)))?;
            let query_embedding = require(section.query_embedding, "query_embedding", &ctx)?
                .into_config(&format!("{}.query_embedding", ctx))?;
            models.push(ModelConfig {
                name,
                query_embedding,
            });
        }

        let indices = require(file.indices, "indices", "root")?
            .into_iter()
            .map(IndexSection::into_config)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            project_name,
            run,
            data,
            models,
            indices,
        })
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(output_root) = lookup("BENCH_OUTPUT_ROOT") {
            self.run.output_root = PathBuf::from(output_root);
        }

        if let Some(topn) = lookup("BENCH_TOPN") {
            if let Ok(topn) = topn.parse() {
                self.run.topn = topn;
            }
        }

        if let Some(fail_fast) = lookup("BENCH_FAIL_FAST") {
            match fail_fast.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.run.fail_fast = true,
                "0" | "false" | "no" => self.run.fail_fast = false,
                _ => {}
            }
        }
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "retrieval-bench")
            .map(|dirs| dirs.config_dir().join("bench.yaml"))
    }

    /// Validate run-level invariants.
    pub fn validate(&self) -> Result<()> {
        if self.run.k_list.is_empty() {
            return Err(BenchError::Config("run.k_list must not be empty".to_string()));
        }

        if self.run.k_list.contains(&0) {
            return Err(BenchError::Config(
                "run.k_list values must be positive".to_string(),
            ));
        }

        if self.run.topn == 0 {
            return Err(BenchError::Config("run.topn must be positive".to_string()));
        }

        if self.models.is_empty() {
            return Err(BenchError::Config("At least one model is required".to_string()));
        }

        if self.indices.is_empty() {
            return Err(BenchError::Config("At least one index is required".to_string()));
        }

        for model in &self.models {
            if model.query_embedding.dim == 0 {
                return Err(BenchError::Config(format!(
                    "models.{}.query_embedding.dim must be positive",
                    model.name
                )));
            }
        }

        for index in &self.indices {
            if let Some(dv) = &index.doc_vector {
                if dv.dim == 0 {
                    return Err(BenchError::Config(format!(
                        "indices.{}.doc_vector.dim must be positive",
                        index.name
                    )));
                }
            }
        }

        Ok(())
    }
}
