//! Benchmark orchestration.
//!
//! Indices are processed one at a time, models one at a time within an
//! index. A backend that cannot be built skips its index; a model run that
//! fails is recorded as an error row. With `fail_fast` either failure ends
//! the whole benchmark instead.

use crate::compare::compare_models;
use crate::config::{BenchConfig, IndexConfig, ModelConfig, RunConfig};
use crate::dataset::{QueryRecord, load_queries};
use crate::error::{BenchError, Result};
use crate::evaluator::{Evaluator, ModelRun, SummaryRow};
use crate::report::{DetailSheet, RunReport};
use crate::search::{SearchBackend, build_backend};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{Instrument, error, info, info_span};

/// Identity and location of one benchmark run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// `YYYYMMDD_HHMM` of the start time.
    pub run_id: String,
    pub run_dir: PathBuf,
    pub started_at: String,
    pub config_path: String,
}

impl RunContext {
    /// Create the run directory `<output_root>/<run_id>`.
    pub fn create(config: &BenchConfig, config_path: &Path) -> Result<Self> {
        let now = Local::now();
        let run_id = now.format("%Y%m%d_%H%M").to_string();
        let run_dir = config.run.output_root.join(&run_id);
        fs::create_dir_all(&run_dir).map_err(|e| BenchError::io(&run_dir, e))?;

        Ok(Self {
            run_id,
            run_dir,
            started_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            config_path: config_path.display().to_string(),
        })
    }

    /// Path of the run log.
    pub fn log_path(&self) -> PathBuf {
        self.run_dir.join("run.log")
    }

    /// Open the run log for appending. Runs started within the same minute
    /// share a run directory, so earlier output is kept.
    pub fn open_log(&self) -> Result<File> {
        let path = self.log_path();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BenchError::io(&path, e))
    }
}

/// Rows accumulated over the run.
#[derive(Debug, Default)]
struct RunOutcome {
    summary: Vec<SummaryRow>,
    details: Vec<DetailSheet>,
    failures: Vec<String>,
}

impl RunOutcome {
    fn record_success(&mut self, index: &str, model: &str, k_list: &[usize], run: ModelRun) {
        let row = run.summarize(index, model, k_list);
        let recalls = row
            .recall
            .iter()
            .map(|(k, r)| format!("R@{}={}", k, r))
            .collect::<Vec<_>>()
            .join(", ");
        info!(index, model, queries = row.queries, recall = %recalls, "model run finished");

        self.summary.push(row);
        self.details.push(DetailSheet {
            name: format!("{}_{}", index, model),
            rows: run.details,
        });
    }

    fn record_failure(&mut self, index: &str, model: &str, err: &BenchError) {
        self.failures.push(format!(
            "[RUN FAIL] index={}, model={} ({}): {}",
            index,
            model,
            err.kind(),
            err
        ));
        self.summary
            .push(SummaryRow::failed(index, model, err.to_string()));
    }
}

/// Run one model over an already built backend.
pub async fn run_model(
    backend: &dyn SearchBackend,
    model: &ModelConfig,
    queries: &[QueryRecord],
    run: &RunConfig,
) -> Result<ModelRun> {
    let evaluator = Evaluator::new(backend, model, run.topn, &run.k_list)?;
    evaluator.run(queries).await
}

async fn run_index(
    index: &IndexConfig,
    config: &BenchConfig,
    queries: &[QueryRecord],
    outcome: &mut RunOutcome,
) -> Result<()> {
    info!(index = %index.name, backend = %index.backend, "starting index");

    let backend = match build_backend(index).await {
        Ok(backend) => backend,
        Err(err) => {
            error!(index = %index.name, kind = %err.kind(), error = %err, "index init failed");
            outcome.failures.push(format!(
                "[INDEX INIT FAIL] {} ({}): {}",
                index.name,
                err.kind(),
                err
            ));
            if config.run.fail_fast {
                return Err(err);
            }
            return Ok(());
        }
    };

    for model in &config.models {
        info!(index = %index.name, model = %model.name, "starting model");

        match run_model(backend.as_ref(), model, queries, &config.run).await {
            Ok(run) => outcome.record_success(&index.name, &model.name, &config.run.k_list, run),
            Err(err) => {
                error!(
                    index = %index.name,
                    model = %model.name,
                    kind = %err.kind(),
                    error = %err,
                    "model run failed"
                );
                if config.run.fail_fast {
                    return Err(err);
                }
                outcome.record_failure(&index.name, &model.name, &err);
            }
        }
    }

    Ok(())
}

/// Evaluate every (index, model) pair and compare A against B.
///
/// Events emitted during the run carry a `run` span with the run id, and an
/// `index` span while that index is evaluated.
pub async fn run_benchmark(config: &BenchConfig, ctx: &RunContext) -> Result<RunReport> {
    let span = info_span!("run", run_id = %ctx.run_id);
    execute(config, ctx).instrument(span).await
}

async fn execute(config: &BenchConfig, ctx: &RunContext) -> Result<RunReport> {
    info!(project = %config.project_name, config = %ctx.config_path, "starting benchmark");

    let queries = load_queries(&config.data.queries_path, &config.data.truth_key)?;
    info!(
        count = queries.len(),
        path = %config.data.queries_path.display(),
        "loaded queries"
    );

    let mut outcome = RunOutcome::default();
    for index in &config.indices {
        let span = info_span!("index", name = %index.name);
        run_index(index, config, &queries, &mut outcome)
            .instrument(span)
            .await?;
    }

    let deltas = compare_models(&outcome.summary, &config.run.k_list);
    info!(pairs = deltas.len(), failures = outcome.failures.len(), "benchmark finished");

    Ok(RunReport {
        project_name: config.project_name.clone(),
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.clone(),
        config_path: ctx.config_path.clone(),
        k_list: config.run.k_list.clone(),
        summary: outcome.summary,
        details: outcome.details,
        deltas,
        failures: outcome.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Winner;
    use crate::config::{DataConfig, EmbeddingConfig};
    use serde_json::json;
    use std::io::{self, Read, Write};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: [(&str, &str, &str); 3] = [
        ("d1", "a1", "how do I reset my password"),
        ("d2", "a2", "where is the billing page"),
        ("d3", "a3", "how to delete my account"),
    ];

    fn write_lines(path: &Path, lines: &[serde_json::Value]) {
        let mut file = fs::File::create(path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn fixture(dir: &TempDir) -> BenchConfig {
        let docs_path = dir.path().join("docs.jsonl");
        let queries_path = dir.path().join("queries.jsonl");

        let docs: Vec<_> = DOCS
            .iter()
            .map(|(id, label, text)| json!({"doc_id": id, "answer_id": label, "question": text}))
            .collect();
        write_lines(&docs_path, &docs);

        let queries: Vec<_> = DOCS
            .iter()
            .enumerate()
            .map(|(i, (_, label, text))| {
                json!({"query_id": format!("q{}", i + 1), "question": text, "answer_ids": [label]})
            })
            .collect();
        write_lines(&queries_path, &queries);

        let mut faq = IndexConfig::new("faq", "mock", "question_vt");
        faq.docs_path = Some(docs_path);
        faq.doc_vector = Some(EmbeddingConfig::local_hash(16, "A"));

        BenchConfig {
            project_name: "test".to_string(),
            run: RunConfig {
                output_root: dir.path().join("runs"),
                k_list: vec![1, 3],
                topn: 3,
                fail_fast: false,
            },
            data: DataConfig {
                queries_path,
                truth_key: "answer_ids".to_string(),
            },
            models: vec![
                ModelConfig {
                    name: "A".to_string(),
                    query_embedding: EmbeddingConfig::local_hash(16, "A"),
                },
                ModelConfig {
                    name: "B".to_string(),
                    query_embedding: EmbeddingConfig::local_hash(16, "B"),
                },
            ],
            indices: vec![faq],
        }
    }

    fn context(dir: &TempDir) -> RunContext {
        RunContext {
            run_id: "20260101_0000".to_string(),
            run_dir: dir.path().join("runs/20260101_0000"),
            started_at: "2026-01-01 00:00:00".to_string(),
            config_path: "bench.yaml".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_end_to_end() {
        let dir = TempDir::new().unwrap();
        let config = fixture(&dir);

        let report = run_benchmark(&config, &context(&dir)).await.unwrap();

        assert_eq!(report.summary.len(), 2);
        let a = &report.summary[0];
        assert_eq!(a.model, "A");
        assert_eq!(a.queries, 3);
        // Same salt as the documents: every question finds its own document.
        assert_eq!(a.recall_at(1), 1.0);
        assert_eq!(report.summary[1].recall_at(3), 1.0);

        assert_eq!(report.details.len(), 2);
        assert_eq!(report.details[0].name, "faq_A");
        assert_eq!(report.details[0].rows.len(), 3);

        assert_eq!(report.deltas.len(), 1);
        assert_eq!(report.deltas[0].winner, Winner::A);
        assert_eq!(report.deltas[0].delta(3), Some(0.0));
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_runs_are_reproducible() {
        let dir = TempDir::new().unwrap();
        let config = fixture(&dir);

        let first = run_benchmark(&config, &context(&dir)).await.unwrap();
        let second = run_benchmark(&config, &context(&dir)).await.unwrap();
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.deltas, second.deltas);
    }

    #[tokio::test]
    async fn test_index_init_failure_skips_index() {
        let dir = TempDir::new().unwrap();
        let mut config = fixture(&dir);
        config
            .indices
            .insert(0, IndexConfig::new("broken", "mock", "question_vt"));

        let report = run_benchmark(&config, &context(&dir)).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].starts_with("[INDEX INIT FAIL] broken (configuration):"));
        assert!(report.summary.iter().all(|row| row.index == "faq"));
        assert_eq!(report.deltas.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts() {
        let dir = TempDir::new().unwrap();
        let mut config = fixture(&dir);
        config.run.fail_fast = true;
        config
            .indices
            .insert(0, IndexConfig::new("broken", "nosuch", "question_vt"));

        let err = run_benchmark(&config, &context(&dir)).await.unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
    }

    #[tokio::test]
    async fn test_model_failure_recorded_per_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = fixture(&dir);
        let mut remote = IndexConfig::new("remote", "elasticsearch", "question_vt");
        remote.es_url = Some(server.uri());
        remote.es_index = Some("faq".to_string());
        config.indices.push(remote);

        let report = run_benchmark(&config, &context(&dir)).await.unwrap();

        let failed: Vec<&SummaryRow> = report
            .summary
            .iter()
            .filter(|row| !row.is_success())
            .collect();
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().all(|row| row.index == "remote" && row.queries == 0));
        assert!(failed[0].error.as_deref().unwrap().contains("503"));
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].starts_with("[RUN FAIL] index=remote, model=A (transport):"));

        // Only the healthy index gets compared.
        assert_eq!(report.deltas.len(), 1);
        assert_eq!(report.deltas[0].index, "faq");
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_query_error() {
        let server = MockServer::start().await;
        // One query of model A reaches the server before the run is aborted.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = fixture(&dir);
        config.run.fail_fast = true;
        let mut remote = IndexConfig::new("remote", "elasticsearch", "question_vt");
        remote.es_url = Some(server.uri());
        remote.es_index = Some("faq".to_string());
        config.indices.insert(0, remote);

        let logs = LogBuffer::default();
        let err = {
            let _guard = tracing::subscriber::set_default(logs.subscriber());
            run_benchmark(&config, &context(&dir)).await.unwrap_err()
        };

        assert!(matches!(err, BenchError::HttpStatus { status: 503, .. }));
        let out = logs.contents();
        assert!(!out.contains("index{name=faq}"));
        assert!(!out.contains("benchmark finished"));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_model_only() {
        let dir = TempDir::new().unwrap();
        let mut config = fixture(&dir);
        config.models[1].query_embedding.provider = "nosuch".to_string();

        let report = run_benchmark(&config, &context(&dir)).await.unwrap();
        assert!(report.summary[0].is_success());
        assert!(!report.summary[1].is_success());
        assert!(report.deltas.is_empty());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
            let writer = self.clone();
            tracing_subscriber::fmt()
                .with_ansi(false)
                .with_max_level(tracing::Level::INFO)
                .with_writer(move || writer.clone())
                .finish()
        }

        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_events_carry_run_and_index_spans() {
        let dir = TempDir::new().unwrap();
        let config = fixture(&dir);

        let logs = LogBuffer::default();
        {
            let _guard = tracing::subscriber::set_default(logs.subscriber());
            run_benchmark(&config, &context(&dir)).await.unwrap();
        }

        let out = logs.contents();
        assert!(out.contains("run{run_id=20260101_0000}: "));
        assert!(out.contains("run{run_id=20260101_0000}:index{name=faq}: "));
        assert!(out.contains("model run finished"));
    }

    #[test]
    fn test_run_log_appends() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        fs::create_dir_all(&ctx.run_dir).unwrap();

        writeln!(ctx.open_log().unwrap(), "first run").unwrap();
        writeln!(ctx.open_log().unwrap(), "second run").unwrap();

        let mut log = String::new();
        File::open(ctx.log_path())
            .unwrap()
            .read_to_string(&mut log)
            .unwrap();
        assert_eq!(log, "first run\nsecond run\n");
    }

    #[test]
    fn test_context_creates_run_dir() {
        let dir = TempDir::new().unwrap();
        let config = fixture(&dir);

        let ctx = RunContext::create(&config, Path::new("bench.yaml")).unwrap();
        assert_eq!(ctx.run_id.len(), "YYYYMMDD_HHMM".len());
        assert!(ctx.run_dir.is_dir());
        assert!(ctx.log_path().ends_with("run.log"));
    }
}
