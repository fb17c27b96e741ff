//! retrieval-bench CLI
//!
//! Runs every configured query-embedding model against every configured
//! index and writes a workbook and markdown report into a fresh run
//! directory.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use retrieval_bench::{
    config::BenchConfig,
    report::{FileReportSink, ReportSink},
    runner::{RunContext, run_benchmark},
};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Retrieval benchmark - compare query-embedding models by recall@k
#[derive(Parser)]
#[command(name = "retrieval-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the benchmark config (YAML). Defaults to bench.yaml in the
    /// user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, ctx) = match prepare(cli) {
        Ok(prepared) => prepared,
        Err(err) => {
            init_tracing(None);
            error!("{:#}", err);
            return ExitCode::FAILURE;
        }
    };

    match ctx.open_log() {
        Ok(file) => init_tracing(Some(file)),
        Err(err) => {
            init_tracing(None);
            warn!(error = %err, "could not open run log");
        }
    }

    match run(&config, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn prepare(cli: Cli) -> Result<(BenchConfig, RunContext)> {
    let config_path = match cli.config {
        Some(path) => path,
        None => BenchConfig::config_file_path()
            .ok_or_else(|| anyhow!("No --config given and no user config directory found"))?,
    };

    let config = BenchConfig::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
    config.validate().context("Invalid configuration")?;

    let ctx = RunContext::create(&config, &config_path).context("Failed to create run directory")?;
    Ok((config, ctx))
}

async fn run(config: &BenchConfig, ctx: &RunContext) -> Result<()> {
    info!(run_dir = %ctx.run_dir.display(), "run directory ready");

    let report = run_benchmark(config, ctx).await.context("Benchmark aborted")?;

    let sink = FileReportSink::new(&ctx.run_dir);
    for path in sink.write(&report).context("Failed to write report")? {
        info!(path = %path.display(), "wrote artifact");
    }

    if !report.failures.is_empty() {
        warn!(count = report.failures.len(), "benchmark finished with failures");
    }
    Ok(())
}

fn init_tracing(log_file: Option<File>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}
