//! Markdown report template.

/// Templates used when rendering run reports.
pub struct Templates;

impl Templates {
    /// Top-level `report.md` layout.
    ///
    /// Placeholders: `{project_name}`, `{run_id}`, `{started_at}`,
    /// `{config_path}`, `{summary_table_md}`, `{winner_summary_md}`,
    /// `{delta_highlights_md}`, `{delta_table_md}`, `{failures_md}`.
    pub fn report() -> &'static str {
        r#"# Retrieval Benchmark Report: {project_name}

- Run ID: `{run_id}`
- Started at: {started_at}
- Config: `{config_path}`

## Summary

{summary_table_md}

## A vs B

{winner_summary_md}
{delta_highlights_md}
### Delta per index

{delta_table_md}

## Failures

{failures_md}
"#
    }

    /// Fill `template` with `(placeholder, value)` pairs.
    ///
    /// The template is scanned once, so braces inside substituted values are
    /// copied verbatim. Unknown placeholders are left in place.
    pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let found = after.find('}').and_then(|end| {
                let key = &after[..end];
                values
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (*value, end))
            });

            match found {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill() {
        let out = Templates::fill("a={a}, b={b}, a again={a}", &[("a", "1"), ("b", "two")]);
        assert_eq!(out, "a=1, b=two, a again=1");
    }

    #[test]
    fn test_values_are_not_refilled() {
        let out = Templates::fill(
            "{summary}\n{failures}",
            &[("summary", "error: {failures}"), ("failures", "none")],
        );
        assert_eq!(out, "error: {failures}\nnone");
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        assert_eq!(Templates::fill("{x} {y", &[("z", "1")]), "{x} {y");
    }

    #[test]
    fn test_report_has_all_placeholders() {
        let template = Templates::report();
        for key in [
            "project_name",
            "run_id",
            "started_at",
            "config_path",
            "summary_table_md",
            "winner_summary_md",
            "delta_highlights_md",
            "delta_table_md",
            "failures_md",
        ] {
            assert!(template.contains(&format!("{{{}}}", key)), "missing {}", key);
        }
    }
}
