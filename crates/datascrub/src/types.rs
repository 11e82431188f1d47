//! Wire types exchanged with the cleaning service.

use crate::error::{DatascrubError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Issue report
// ============================================================================

/// Server-produced report of detected data-quality problems.
///
/// Keys are category names (`missing`, `duplicates`, ...) and values are the
/// raw category details. Key order is the order the server sent them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueReport(Map<String, Value>);

impl IssueReport {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a report from an arbitrary JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(DatascrubError::MalformedReport(format!(
                "expected an object of categories, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Categories in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for IssueReport {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct FilenameRequest<'a> {
    pub filename: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub issues: IssueReport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    pub download_url: String,
    #[serde(default)]
    pub applied_methods: Vec<String>,
    #[serde(default)]
    pub cleaned_data_html: Option<String>,
    /// First row holds the column headers, the rest are data rows.
    #[serde(default)]
    pub df_head: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualizeResponse {
    #[serde(default)]
    pub before_plot: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Decode a 2xx response body.
///
/// A body whose `error` field is set (non-empty string, `true`, non-zero
/// number, array or object) is a server-reported failure; `null`, `false`,
/// `0` and `""` are ignored. Anything that does not fit `T` is a malformed
/// response.
pub fn decode_reply<T: DeserializeOwned>(body: Value) -> Result<T> {
    if let Some(error) = body.get("error").filter(|error| is_set(error)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(DatascrubError::ServerReported(message));
    }

    serde_json::from_value(body).map_err(|e| DatascrubError::MalformedResponse(e.to_string()))
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Process outcome
// ============================================================================

/// Preview of the cleaned dataset returned by `/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CleanedPreview {
    /// Table already rendered to HTML by the server.
    Html(String),
    /// Header row plus data rows.
    Table(PreviewTable),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    /// Build a table from `df_head` rows; `None` if there is no header row.
    pub fn from_rows(rows: &[Vec<Value>]) -> Option<Self> {
        let (header, data) = rows.split_first()?;
        Some(Self {
            headers: header.iter().map(display_value).collect(),
            rows: data
                .iter()
                .map(|row| row.iter().map(display_value).collect())
                .collect(),
        })
    }
}

/// Result of a successful cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub download_url: String,
    pub applied_methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<CleanedPreview>,
}

impl From<ProcessResponse> for ProcessOutcome {
    fn from(response: ProcessResponse) -> Self {
        let preview = match (response.cleaned_data_html, response.df_head) {
            (Some(html), _) if !html.trim().is_empty() => Some(CleanedPreview::Html(html)),
            (_, Some(rows)) => PreviewTable::from_rows(&rows).map(CleanedPreview::Table),
            _ => None,
        };

        Self {
            download_url: response.download_url,
            applied_methods: response.applied_methods,
            preview,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Render a JSON value the way it is interpolated into report text:
/// strings without quotes, `null` as an empty cell, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_report_preserves_key_order() {
        let report: IssueReport =
            serde_json::from_str(r#"{"outliers": {}, "missing": {}, "duplicates": 0}"#).unwrap();
        let keys: Vec<&str> = report.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["outliers", "missing", "duplicates"]);
    }

    #[test]
    fn test_issue_report_from_non_object_is_malformed() {
        let err = IssueReport::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_REPORT");
    }

    #[test]
    fn test_decode_reply_server_error() {
        let err = decode_reply::<UploadResponse>(json!({"error": "Invalid file type"})).unwrap_err();
        assert!(matches!(err, DatascrubError::ServerReported(ref m) if m == "Invalid file type"));
    }

    #[test]
    fn test_decode_reply_ignores_unset_error() {
        for error in [json!(null), json!(""), json!(false), json!(0)] {
            let reply: UploadResponse =
                decode_reply(json!({"filename": "x.csv", "error": error})).unwrap();
            assert_eq!(reply.filename, "x.csv");
        }

        let err = decode_reply::<UploadResponse>(json!({"filename": "x.csv", "error": true}))
            .unwrap_err();
        assert_eq!(err.error_code(), "SERVER_ERROR");
    }

    #[test]
    fn test_decode_reply_missing_field() {
        let err = decode_reply::<UploadResponse>(json!({"name": "x.csv"})).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_RESPONSE");
    }

    #[test]
    fn test_process_outcome_prefers_html_preview() {
        let response: ProcessResponse = serde_json::from_value(json!({
            "download_url": "/download/cleaned_1.csv",
            "applied_methods": ["Removed duplicates"],
            "cleaned_data_html": "<table></table>",
            "df_head": [["a"], [1]]
        }))
        .unwrap();

        let outcome = ProcessOutcome::from(response);
        assert_eq!(outcome.applied_methods, vec!["Removed duplicates"]);
        assert_eq!(
            outcome.preview,
            Some(CleanedPreview::Html("<table></table>".to_string()))
        );
    }

    #[test]
    fn test_process_outcome_from_df_head() {
        let response: ProcessResponse = serde_json::from_value(json!({
            "download_url": "/download/cleaned_1.csv",
            "df_head": [["name", "age"], ["ann", 31], ["bob", null]]
        }))
        .unwrap();

        let outcome = ProcessOutcome::from(response);
        let Some(CleanedPreview::Table(table)) = outcome.preview else {
            panic!("expected a table preview");
        };
        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.rows[0], vec!["ann", "31"]);
        assert_eq!(table.rows[1], vec!["bob", ""]);
        assert!(outcome.applied_methods.is_empty());
    }

    #[test]
    fn test_process_outcome_minimal_variant() {
        let response: ProcessResponse =
            serde_json::from_value(json!({"download_url": "/download/c.csv"})).unwrap();
        let outcome = ProcessOutcome::from(response);
        assert!(outcome.preview.is_none());
    }
}
