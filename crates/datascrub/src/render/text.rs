//! Plain-text rendering for terminals.

use crate::report::{AggregatedReport, DetailFragment};
use crate::types::{CleanedPreview, PreviewTable, ProcessOutcome};

const RULE_WIDTH: usize = 40;
const MAX_CELL_WIDTH: usize = 20;

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Summary badges on one line: `[Missing Values: 2] [Outliers: 1]`.
pub fn summary_line(report: &AggregatedReport) -> String {
    report
        .summaries
        .iter()
        .map(|summary| format!("[{}: {}]", summary.display_name, summary.count))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full issue report: heading, badges, then indented details per category.
pub fn report(report: &AggregatedReport) -> String {
    if !report.has_issues {
        return "No issues found.\n".to_string();
    }

    let mut out = format!("ISSUES FOUND ({} total)\n{}\n", report.total_issue_count, rule());
    out.push_str(&format!("  {}\n\n", summary_line(report)));

    for summary in &report.summaries {
        out.push_str(&format!("{}\n", summary.display_name));
        for fragment in &summary.details {
            out.push_str(&detail_lines(fragment));
        }
    }
    out
}

fn detail_lines(fragment: &DetailFragment) -> String {
    match fragment {
        DetailFragment::Total { count } => format!("  Total duplicates: {}\n", count),
        DetailFragment::Entries { entries } => entries
            .iter()
            .map(|entry| format!("  - {}: {}\n", entry.field, entry.value))
            .collect(),
        DetailFragment::Distributions { distributions } => distributions
            .iter()
            .map(|distribution| {
                let mut lines = format!("  - {}\n", distribution.field);
                for share in &distribution.classes {
                    lines.push_str(&format!("      {}: {}\n", share.label, share.formatted));
                }
                lines
            })
            .collect(),
    }
}

/// Cleaning result: applied methods, download location and preview.
pub fn outcome(outcome: &ProcessOutcome) -> String {
    let mut out = format!("CLEANING COMPLETE\n{}\n", rule());

    if !outcome.applied_methods.is_empty() {
        out.push_str("Applied methods:\n");
        for method in &outcome.applied_methods {
            out.push_str(&format!("  - {}\n", method));
        }
    }
    out.push_str(&format!("Download: {}\n", outcome.download_url));

    match &outcome.preview {
        Some(CleanedPreview::Table(table)) => {
            out.push_str("\nPreview:\n");
            out.push_str(&preview_table(table));
        }
        Some(CleanedPreview::Html(_)) => {
            out.push_str("\nPreview available as HTML (use --html to save it)\n");
        }
        None => {}
    }
    out
}

/// Left-aligned table with cells cut to a fixed maximum width.
pub fn preview_table(table: &PreviewTable) -> String {
    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.headers.len()))
        .max()
        .unwrap_or(0);

    let cell = |row: &[String], i: usize| -> String {
        truncate(row.get(i).map(String::as_str).unwrap_or(""), MAX_CELL_WIDTH)
    };

    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            std::iter::once(&table.headers)
                .chain(table.rows.iter())
                .map(|row| cell(row, i).chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |row: &[String]| -> String {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| format!("{:<width$}", cell(row, i), width = *width))
            .collect();
        format!("{}\n", cells.join("  ").trim_end())
    };

    let mut out = line(&table.headers);
    let total_width = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
    out.push_str(&format!("{}\n", "-".repeat(total_width)));
    for row in &table.rows {
        out.push_str(&line(row));
    }
    out
}

/// Truncate to `max_len` characters, ending in "..." when cut.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportAggregator;
    use crate::types::IssueReport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_report_text() {
        let issues = IssueReport::from_value(json!({
            "missing": {"age": 3},
            "duplicates": 2,
            "class_imbalance": {"churn": {"no": 0.92, "yes": 0.08}}
        }))
        .unwrap();
        let aggregated = ReportAggregator::aggregate(&issues).unwrap();

        assert_eq!(
            report(&aggregated),
            "ISSUES FOUND (4 total)\n\
             ----------------------------------------\n  \
             [Missing Values: 1] [Duplicate Data: 2] [Class Imbalance: 1]\n\n\
             Missing Values\n  \
             - age: 3\n\
             Duplicate Data\n  \
             Total duplicates: 2\n\
             Class Imbalance\n  \
             - churn\n      \
             no: 0.9200\n      \
             yes: 0.0800\n"
        );
    }

    #[test]
    fn test_clean_report_text() {
        assert_eq!(report(&AggregatedReport::default()), "No issues found.\n");
    }

    #[test]
    fn test_preview_table_alignment() {
        let table = PreviewTable {
            headers: vec!["id".to_string(), "city".to_string()],
            rows: vec![
                vec!["1".to_string(), "Alexandria".to_string()],
                vec!["22".to_string(), "Giza".to_string()],
            ],
        };
        assert_eq!(
            preview_table(&table),
            "id  city\n\
             --------------\n\
             1   Alexandria\n\
             22  Giza\n"
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_outcome_lists_methods() {
        let text = outcome(&ProcessOutcome {
            download_url: "/download/cleaned.csv".to_string(),
            applied_methods: vec!["Dropped duplicates".to_string()],
            preview: None,
        });
        assert!(text.contains("  - Dropped duplicates\n"));
        assert!(text.contains("Download: /download/cleaned.csv\n"));
    }
}
