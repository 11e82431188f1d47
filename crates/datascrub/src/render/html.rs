//! HTML fragments for web front-ends.

use crate::pipeline::PipelineSnapshot;
use crate::report::{AggregatedReport, CategorySummary, DetailFragment};
use crate::types::{CleanedPreview, PreviewTable, ProcessOutcome};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Table classes used for the cleaned-data preview.
pub const PREVIEW_TABLE_CLASSES: &str = "table table-bordered table-striped table-sm text-center";

// ============================================================================
// Issue report
// ============================================================================

/// One `<tr>` per category summary.
pub fn issue_rows(report: &AggregatedReport) -> String {
    report.summaries.iter().map(issue_row).collect()
}

fn issue_row(summary: &CategorySummary) -> String {
    let details: String = summary.details.iter().map(detail_html).collect();
    format!(
        "<tr><td><strong class=\"text-primary\">{}</strong></td><td>{}</td></tr>\n",
        encode_text(&summary.display_name),
        details
    )
}

/// Render one detail fragment.
pub fn detail_html(fragment: &DetailFragment) -> String {
    match fragment {
        DetailFragment::Total { count } => format!("<p>Total duplicates: {}</p>", count),
        DetailFragment::Entries { entries } => {
            let items: String = entries
                .iter()
                .map(|entry| {
                    format!(
                        "<li><strong>{}:</strong> {}</li>",
                        encode_text(&entry.field),
                        encode_text(&entry.value)
                    )
                })
                .collect();
            format!("<ul>{}</ul>", items)
        }
        DetailFragment::Distributions { distributions } => {
            let items: String = distributions
                .iter()
                .map(|distribution| {
                    let classes: String = distribution
                        .classes
                        .iter()
                        .map(|share| {
                            format!("<li>{}: {}</li>", encode_text(&share.label), share.formatted)
                        })
                        .collect();
                    format!(
                        "<li><strong>{}:</strong><ul>{}</ul></li>",
                        encode_text(&distribution.field),
                        classes
                    )
                })
                .collect();
            format!("<ul>{}</ul>", items)
        }
    }
}

/// One badge per category summary.
pub fn summary_badges(report: &AggregatedReport) -> String {
    report
        .summaries
        .iter()
        .map(|summary| {
            format!(
                "<div class=\"issue-badge {}\"><i class=\"bi {}\"></i> {}: {}</div>\n",
                encode_double_quoted_attribute(&summary.badge.style_class),
                encode_double_quoted_attribute(&summary.badge.icon),
                encode_text(&summary.display_name),
                summary.count
            )
        })
        .collect()
}

// ============================================================================
// Results
// ============================================================================

/// Plot gallery, one image per URL.
pub fn gallery(urls: &[String]) -> String {
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            format!(
                "<div class=\"plot\"><img src=\"{}\" class=\"img-fluid\" alt=\"Plot {}\"></div>\n",
                encode_double_quoted_attribute(url),
                i + 1
            )
        })
        .collect()
}

pub fn applied_methods(methods: &[String]) -> String {
    if methods.is_empty() {
        return String::new();
    }
    let items: String = methods
        .iter()
        .map(|method| format!("<li class=\"list-group-item\">{}</li>", encode_text(method)))
        .collect();
    format!("<ul class=\"list-group\">{}</ul>\n", items)
}

/// Cleaned-data preview. Server-rendered HTML is passed through unchanged.
pub fn preview(preview: &CleanedPreview) -> String {
    match preview {
        CleanedPreview::Html(html) => html.clone(),
        CleanedPreview::Table(table) => preview_table(table),
    }
}

pub fn preview_table(table: &PreviewTable) -> String {
    let head: String = table
        .headers
        .iter()
        .map(|header| format!("<th>{}</th>", encode_text(header)))
        .collect();
    let body: String = table
        .rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!("<td>{}</td>", encode_text(cell)))
                .collect();
            format!("<tr>{}</tr>", cells)
        })
        .collect();
    format!(
        "<table class=\"{}\"><thead><tr>{}</tr></thead><tbody>{}</tbody></table>\n",
        PREVIEW_TABLE_CLASSES, head, body
    )
}

fn outcome_section(outcome: &ProcessOutcome) -> String {
    let mut html = String::from("<section id=\"results\">\n");
    html.push_str(&applied_methods(&outcome.applied_methods));
    if let Some(cleaned) = &outcome.preview {
        html.push_str(&preview(cleaned));
    }
    html.push_str(&format!(
        "<a id=\"download-link\" href=\"{}\">Download cleaned data</a>\n",
        encode_double_quoted_attribute(&outcome.download_url)
    ));
    html.push_str("</section>\n");
    html
}

/// Everything the snapshot has to show, as one fragment.
pub fn snapshot(snapshot: &PipelineSnapshot) -> String {
    let mut html = String::new();

    if let Some(report) = snapshot.report.as_ref().filter(|r| r.has_issues) {
        html.push_str("<section id=\"issues-section\">\n<div id=\"issues-summary\">\n");
        html.push_str(&summary_badges(report));
        html.push_str("</div>\n<table id=\"issues-table\" class=\"table\"><tbody>\n");
        html.push_str(&issue_rows(report));
        html.push_str("</tbody></table>\n</section>\n");
    }

    if !snapshot.gallery.is_empty() {
        html.push_str("<section id=\"gallery\">\n");
        html.push_str(&gallery(&snapshot.gallery));
        html.push_str("</section>\n");
    }

    if let Some(outcome) = &snapshot.outcome {
        html.push_str(&outcome_section(outcome));
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportAggregator;
    use crate::types::IssueReport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn aggregate(value: serde_json::Value) -> AggregatedReport {
        ReportAggregator::aggregate(&IssueReport::from_value(value).unwrap()).unwrap()
    }

    #[test]
    fn test_issue_rows_markup() {
        let report = aggregate(json!({"duplicates": 5, "missing": {"age": 3}}));
        assert_eq!(
            issue_rows(&report),
            "<tr><td><strong class=\"text-primary\">Missing Values</strong></td>\
             <td><ul><li><strong>age:</strong> 3</li></ul></td></tr>\n\
             <tr><td><strong class=\"text-primary\">Duplicate Data</strong></td>\
             <td><p>Total duplicates: 5</p></td></tr>\n"
        );
    }

    #[test]
    fn test_summary_badges_markup() {
        let report = aggregate(json!({"dtypes": {"age": "object"}}));
        assert_eq!(
            summary_badges(&report),
            "<div class=\"issue-badge format\"><i class=\"bi bi-type\"></i> Data Type Issues: 1</div>\n"
        );
    }

    #[test]
    fn test_class_imbalance_nested_list() {
        let report = aggregate(json!({"class_imbalance": {"target": {"yes": 0.9, "no": 0.1}}}));
        let html = issue_rows(&report);
        assert!(html.contains("<li><strong>target:</strong><ul><li>yes: 0.9000</li><li>no: 0.1000</li></ul></li>"));
    }

    #[test]
    fn test_values_are_escaped() {
        let report = aggregate(json!({"formatting": {"<b>name</b>": "a & b"}}));
        let html = issue_rows(&report);
        assert!(html.contains("<strong>&lt;b&gt;name&lt;/b&gt;:</strong> a &amp; b"));
    }

    #[test]
    fn test_attribute_values_cannot_break_out_of_quotes() {
        let html = gallery(&["/plots/a.png\" onerror=\"alert(1)".to_string()]);
        assert!(html.contains("src=\"/plots/a.png&quot; onerror=&quot;alert(1)\""));

        let report = aggregate(json!({"odd\"key": {"x": 1}}));
        assert!(summary_badges(&report).contains("class=\"issue-badge odd&quot;key\""));
    }

    #[test]
    fn test_preview_table_uses_table_classes() {
        let table = PreviewTable {
            headers: vec!["id".to_string(), "city".to_string()],
            rows: vec![vec!["1".to_string(), "Cairo".to_string()]],
        };
        assert_eq!(
            preview_table(&table),
            "<table class=\"table table-bordered table-striped table-sm text-center\">\
             <thead><tr><th>id</th><th>city</th></tr></thead>\
             <tbody><tr><td>1</td><td>Cairo</td></tr></tbody></table>\n"
        );
    }

    #[test]
    fn test_empty_snapshot_renders_nothing() {
        assert_eq!(snapshot(&PipelineSnapshot::default()), "");
    }

    #[test]
    fn test_snapshot_with_outcome() {
        let snap = PipelineSnapshot {
            outcome: Some(ProcessOutcome {
                download_url: "/download/cleaned.csv".to_string(),
                applied_methods: vec!["Filled missing values".to_string()],
                preview: Some(CleanedPreview::Html("<table></table>".to_string())),
            }),
            gallery: vec!["/static/plots/a.png".to_string()],
            ..Default::default()
        };
        let html = snapshot(&snap);
        assert!(html.contains("<li class=\"list-group-item\">Filled missing values</li>"));
        assert!(html.contains("<table></table>"));
        assert!(html.contains("href=\"/download/cleaned.csv\""));
        assert!(html.contains("<img src=\"/static/plots/a.png\""));
    }
}
