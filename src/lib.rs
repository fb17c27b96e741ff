//! Retrieval benchmark - compare query-embedding models over vector indices.
//!
//! Each configured model embeds every query of a JSONL dataset, the query
//! vector is searched against each configured index, and the ranked labels
//! are scored against the query's ground truth with recall@k. The models
//! named "A" and "B" are then compared per index.
//!
//! # Quick Start
//!
//! ```no_run
//! use retrieval_bench::{
//!     config::BenchConfig,
//!     report::{FileReportSink, ReportSink},
//!     runner::{RunContext, run_benchmark},
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let path = Path::new("bench.yaml");
//!     let config = BenchConfig::load(path)?;
//!     config.validate()?;
//!
//!     let ctx = RunContext::create(&config, path)?;
//!     let report = run_benchmark(&config, &ctx).await?;
//!     FileReportSink::new(&ctx.run_dir).write(&report)?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Embedder**: deterministic `local_hash` vectors or a remote HTTP service
//! - **SearchBackend**: in-memory mock corpus or Elasticsearch
//! - **Evaluator**: embeds, searches and scores one model over all queries
//! - **compare**: A/B deltas and winners per index
//! - **ReportSink**: writes `summary.json` and `report.md`

pub mod compare;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod search;

pub use compare::{ComparisonRow, Winner, compare_models};
pub use config::BenchConfig;
pub use embedding::Embedder;
pub use error::{BenchError, Result};
pub use evaluator::{Evaluator, SummaryRow};
pub use report::{FileReportSink, ReportSink, RunReport};
pub use runner::{RunContext, run_benchmark};
pub use search::{SearchBackend, SearchHit, build_backend};
