//! Markdown rendering of report rows.

use crate::compare::{ComparisonRow, WinnerCounts, delta_key, top_deltas};
use crate::dataset::Record;
use serde_json::Value;
use std::collections::BTreeSet;

/// Columns that lead every table when present, in this order.
const PREFERRED_COLUMNS: [&str; 5] = ["index", "model", "queries", "winner", "error"];

/// Number of rows listed in each highlights section.
pub const HIGHLIGHT_COUNT: usize = 3;

/// Union of all keys: preferred columns first, the rest sorted.
pub fn ordered_headers(rows: &[Record]) -> Vec<String> {
    let keys: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut headers: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|col| keys.contains(*col))
        .map(|col| col.to_string())
        .collect();
    headers.extend(
        keys.iter()
            .filter(|key| !PREFERRED_COLUMNS.contains(*key))
            .map(|key| key.to_string()),
    );
    headers
}

fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render rows as a markdown table.
pub fn render_table_md(rows: &[Record]) -> String {
    let headers = ordered_headers(rows);
    if headers.is_empty() {
        return "_No results_".to_string();
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!("| {} |", vec!["---"; headers.len()].join(" | ")));
    for row in rows {
        let cells: Vec<String> = headers.iter().map(|h| format_cell(row.get(h))).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}

/// Bullet list with the compared-index count and winner tallies.
pub fn render_winner_summary(rows: &[ComparisonRow]) -> String {
    let counts = WinnerCounts::tally(rows);
    format!(
        "- Indices compared (A vs B pairs): {}\n- Winner count: A={}, B={}\n",
        counts.compared, counts.a, counts.b
    )
}

fn render_bullets(rows: &[&ComparisonRow], title: &str) -> String {
    if rows.is_empty() {
        return format!("- {}: _None_\n", title);
    }

    let key = delta_key(1);
    let mut out = format!("- {}:\n", title);
    for row in rows {
        let delta = row.delta(1).map(|d| d.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "  - {} : {}={} (winner={})\n",
            row.index, key, delta, row.winner
        ));
    }
    out
}

/// Top improvements and regressions of A over B by recall@1.
pub fn render_delta_highlights(rows: &[ComparisonRow]) -> String {
    let (best, worst) = top_deltas(rows, 1, HIGHLIGHT_COUNT);
    let mut out = render_bullets(&best, "Top improvements (A-B) by R@1");
    out.push_str(&render_bullets(&worst, "Top regressions (A-B) by R@1"));
    out
}
