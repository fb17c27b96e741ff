//! Durable artifacts of a benchmark run.
//!
//! A [`ReportSink`] receives the finished [`RunReport`]. The file sink writes
//! two artifacts into the run directory:
//! - `summary.json`: a workbook of named sheets (Summary, Delta, one detail
//!   sheet per index/model run)
//! - `report.md`: a human-readable report with summary, A/B and failure
//!   sections

mod markdown;
mod template;

pub use markdown::{
    ordered_headers, render_delta_highlights, render_table_md, render_winner_summary,
};
pub use template::Templates;

use crate::compare::ComparisonRow;
use crate::dataset::Record;
use crate::error::{BenchError, Result};
use crate::evaluator::{DetailRow, SummaryRow};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// File name of the JSON workbook.
pub const WORKBOOK_FILENAME: &str = "summary.json";

/// File name of the markdown report.
pub const REPORT_FILENAME: &str = "report.md";

/// Longest sheet name kept in the workbook.
pub const MAX_SHEET_NAME: usize = 31;

/// Detail rows of one (index, model) run.
#[derive(Debug, Clone)]
pub struct DetailSheet {
    /// `<index>_<model>`.
    pub name: String,
    pub rows: Vec<DetailRow>,
}

/// Everything a finished run hands to the report sink.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub project_name: String,
    pub run_id: String,
    pub started_at: String,
    pub config_path: String,
    pub k_list: Vec<usize>,
    pub summary: Vec<SummaryRow>,
    pub details: Vec<DetailSheet>,
    pub deltas: Vec<ComparisonRow>,
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn summary_records(&self) -> Vec<Record> {
        self.summary.iter().map(SummaryRow::to_record).collect()
    }

    pub fn delta_records(&self) -> Vec<Record> {
        self.deltas.iter().map(ComparisonRow::to_record).collect()
    }

    /// Sheets in output order: Summary, Delta, then detail sheets.
    pub fn workbook(&self) -> Vec<Sheet> {
        let mut sheets = vec![
            Sheet::new("Summary", self.summary_records()),
            Sheet::new("Delta", self.delta_records()),
        ];
        sheets.extend(self.details.iter().map(|detail| {
            Sheet::new(
                &detail.name,
                detail.rows.iter().map(DetailRow::to_record).collect(),
            )
        }));
        sheets
    }

    /// Render `report.md`.
    pub fn render_markdown(&self) -> String {
        let summary_md = render_table_md(&self.summary_records());
        let delta_md = if self.deltas.is_empty() {
            "_No A/B pairs_".to_string()
        } else {
            render_table_md(&self.delta_records())
        };
        let failures_md = if self.failures.is_empty() {
            "_None_".to_string()
        } else {
            self.failures
                .iter()
                .map(|f| format!("- {}", f))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Templates::fill(
            Templates::report(),
            &[
                ("project_name", self.project_name.as_str()),
                ("run_id", self.run_id.as_str()),
                ("started_at", self.started_at.as_str()),
                ("config_path", self.config_path.as_str()),
                ("summary_table_md", summary_md.as_str()),
                ("winner_summary_md", render_winner_summary(&self.deltas).as_str()),
                ("delta_highlights_md", render_delta_highlights(&self.deltas).as_str()),
                ("delta_table_md", delta_md.as_str()),
                ("failures_md", failures_md.as_str()),
            ],
        )
    }
}

/// One named table of the workbook.
#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Record>,
}

impl Sheet {
    /// Create a sheet, truncating the name to [`MAX_SHEET_NAME`] characters.
    pub fn new(name: &str, rows: Vec<Record>) -> Self {
        Self {
            name: name.chars().take(MAX_SHEET_NAME).collect(),
            rows,
        }
    }
}

/// Consumer of finished runs.
pub trait ReportSink {
    /// Persist the report, returning the paths written.
    fn write(&self, report: &RunReport) -> Result<Vec<PathBuf>>;
}

/// Writes the workbook and markdown report into a directory.
pub struct FileReportSink {
    dir: PathBuf,
}

impl FileReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for FileReportSink {
    fn write(&self, report: &RunReport) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| BenchError::io(&self.dir, e))?;
        }

        let workbook_path = self.dir.join(WORKBOOK_FILENAME);
        let workbook = serde_json::to_string_pretty(&report.workbook())
            .map_err(|e| BenchError::Serialization(e.to_string()))?;
        fs::write(&workbook_path, workbook).map_err(|e| BenchError::io(&workbook_path, e))?;

        let report_path = self.dir.join(REPORT_FILENAME);
        fs::write(&report_path, report.render_markdown())
            .map_err(|e| BenchError::io(&report_path, e))?;

        Ok(vec![workbook_path, report_path])
    }
}
