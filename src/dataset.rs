//! Loading of query and document sets.
//!
//! Both inputs are JSONL files: one JSON object per line, blank lines
//! ignored.

use crate::error::{BenchError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// A JSON object read from a JSONL file.
pub type Record = Map<String, Value>;

/// One evaluation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub query_id: String,
    pub question: String,
    /// Labels considered correct for this query.
    pub truth: BTreeSet<String>,
}

impl QueryRecord {
    /// Build a query from a raw record, reading ground truth from `truth_key`.
    pub fn from_record(record: &Record, truth_key: &str) -> Self {
        Self {
            query_id: field_string(record, "query_id"),
            question: field_string(record, "question"),
            truth: truth_set(record.get(truth_key)),
        }
    }
}

/// Render a JSON value as a label: strings verbatim, null as empty.
pub fn value_to_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Read `key` from a record as a label, empty when absent.
pub fn field_string(record: &Record, key: &str) -> String {
    record.get(key).map(value_to_label).unwrap_or_default()
}

/// Coerce a truth value to a set: a sequence becomes a set of its elements,
/// a scalar a singleton. Absent or null values give the empty set.
pub fn truth_set(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        // A null truth means "no ground truth", not a label named after null.
        None | Some(Value::Null) => BTreeSet::new(),
        Some(Value::Array(items)) => items.iter().map(value_to_label).collect(),
        Some(scalar) => BTreeSet::from([value_to_label(scalar)]),
    }
}

/// Read every non-blank line of a JSONL file as a JSON object.
pub fn read_jsonl(path: &Path) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;

    let mut records = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: Record =
            serde_json::from_str(line).map_err(|e| BenchError::InvalidRecord {
                path: path.to_path_buf(),
                line: line_num + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    Ok(records)
}

/// Load the query set.
pub fn load_queries(path: &Path, truth_key: &str) -> Result<Vec<QueryRecord>> {
    Ok(read_jsonl(path)?
        .iter()
        .map(|record| QueryRecord::from_record(record, truth_key))
        .collect())
}
