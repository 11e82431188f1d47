//! Integration tests for the cleaning-service client.
//!
//! These tests drive the pipeline controller end-to-end against a mocked
//! HTTP service.

use datascrub::render::html;
use datascrub::{
    AnalysisOutcome, ClientConfig, CleanedPreview, DatascrubError, IssueReport, PipelineController,
    PipelineEvent, PipelineState, ReportAggregator, UploadFile,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_report() -> Value {
    let raw = std::fs::read_to_string(fixtures_path().join("issues_report.json"))
        .expect("Failed to read issues fixture");
    serde_json::from_str(&raw).expect("Fixture is not valid JSON")
}

async fn sample_file() -> UploadFile {
    UploadFile::from_path(fixtures_path().join("sample.csv"))
        .await
        .expect("Failed to read sample.csv")
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .timeout_secs(5)
        .build()
        .expect("valid config")
}

fn controller_for(server: &MockServer) -> (PipelineController, Arc<Mutex<Vec<PipelineEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let controller = PipelineController::builder()
        .config(config_for(server))
        .on_event(move |event| sink.lock().push(event.clone()))
        .build()
        .expect("controller should build");
    (controller, events)
}

async fn mount_upload(server: &MockServer, filename: &str) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "filename": filename })))
        .mount(server)
        .await;
}

async fn mount_json(server: &MockServer, endpoint: &str, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// Aggregation of a realistic report
// ============================================================================

#[test]
fn test_fixture_report_aggregation() {
    let issues = IssueReport::from_value(fixture_report()).unwrap();
    let report = ReportAggregator::aggregate(&issues).unwrap();

    let names: Vec<&str> = report
        .summaries
        .iter()
        .map(|s| s.display_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Missing Values",
            "Duplicate Data",
            "Format Issues",
            "Outliers",
            "Class Imbalance",
            "Lexical Issues",
            "encoding_warnings",
        ]
    );
    assert_eq!(report.total_issue_count, 7);
    assert!(report.has_issues);

    let unknown = report.summary("encoding_warnings").unwrap();
    assert_eq!(unknown.badge.style_class, "encoding_warnings");
    assert_eq!(unknown.badge.icon, "bi-exclamation-circle");
}

// ============================================================================
// End-to-end flows
// ============================================================================

#[tokio::test]
async fn test_full_flow_upload_to_download() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_json(json!({ "filename": "sample.csv" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "issues": fixture_report() })))
        .mount(&server)
        .await;
    mount_json(
        &server,
        "/visualize",
        200,
        json!({ "before_plot": ["/static/plots/age_before.png"] }),
    )
    .await;
    mount_json(
        &server,
        "/process",
        200,
        json!({
            "download_url": "/download/cleaned_sample.csv",
            "applied_methods": ["Removed duplicate rows", "Imputed missing values in age"],
            "cleaned_data_html": "<table class=\"table\"></table>"
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/download/cleaned_sample.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id,name\n1,Alice\n".to_vec()))
        .mount(&server)
        .await;

    let (mut controller, events) = controller_for(&server);
    let download_dir = tempfile::tempdir().unwrap();

    let analysis = controller.submit_upload(sample_file().await).await.unwrap();
    let AnalysisOutcome::IssuesFound(report) = analysis else {
        panic!("expected issues");
    };
    assert_eq!(report.total_issue_count, 7);
    assert_eq!(controller.state(), PipelineState::ReviewingIssues);

    let plots = controller.request_visualization().await.unwrap();
    assert_eq!(plots, vec!["/static/plots/age_before.png"]);

    let outcome = controller.confirm_process().await.unwrap();
    assert_eq!(outcome.applied_methods.len(), 2);
    assert!(matches!(outcome.preview, Some(CleanedPreview::Html(_))));
    assert_eq!(controller.state(), PipelineState::Completed);

    let saved = controller
        .download_result(Some(download_dir.path()))
        .await
        .unwrap();
    assert_eq!(saved, download_dir.path().join("cleaned_sample.csv"));
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), "id,name\n1,Alice\n");

    let fragment = html::snapshot(&controller.snapshot());
    assert!(fragment.contains(
        "<div class=\"issue-badge missing\"><i class=\"bi bi-exclamation-triangle\"></i> Missing Values: 1</div>"
    ));
    assert!(fragment.contains("age_before.png"));
    assert!(fragment.contains("Imputed missing values in age"));

    let states: Vec<PipelineState> = events
        .lock()
        .iter()
        .filter_map(|event| match event {
            PipelineEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            PipelineState::Uploading,
            PipelineState::Analyzing,
            PipelineState::ReviewingIssues,
            PipelineState::Processing,
            PipelineState::Completed,
        ]
    );
    assert!(controller.busy_label().is_none());
}

#[tokio::test]
async fn test_clean_data_returns_to_idle() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;
    mount_json(
        &server,
        "/analyze",
        200,
        json!({ "issues": { "missing": {}, "duplicates": 0, "outliers": {} } }),
    )
    .await;

    let (mut controller, events) = controller_for(&server);
    let analysis = controller.submit_upload(sample_file().await).await.unwrap();

    assert_eq!(analysis, AnalysisOutcome::Clean);
    assert_eq!(controller.state(), PipelineState::Idle);
    assert!(
        events
            .lock()
            .iter()
            .any(|event| matches!(event, PipelineEvent::CleanData { .. }))
    );
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_upload_http_error_resets() {
    let server = MockServer::start().await;
    mount_json(&server, "/upload", 400, json!({ "error": "Invalid file type" })).await;

    let (mut controller, _events) = controller_for(&server);
    let err = controller
        .submit_upload(sample_file().await)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Upload failed: HTTP error! Status: 400");
    assert_eq!(err.status(), Some(400));
    assert_eq!(controller.state(), PipelineState::Idle);
    assert_eq!(controller.session().filename, "");
}

#[tokio::test]
async fn test_analyze_server_reported_error_resets() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;
    mount_json(
        &server,
        "/analyze",
        200,
        json!({ "error": "Unsupported file format for analysis" }),
    )
    .await;

    let (mut controller, events) = controller_for(&server);
    let err = controller
        .submit_upload(sample_file().await)
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        DatascrubError::WithContext { source, .. }
            if matches!(**source, DatascrubError::ServerReported(_))
    ));
    assert_eq!(
        err.to_string(),
        "Analysis failed: Unsupported file format for analysis"
    );
    assert_eq!(controller.state(), PipelineState::Idle);
    assert!(!controller.session().is_active());
    assert!(events.lock().iter().any(|event| matches!(
        event,
        PipelineEvent::Failed { recoverable: false, .. }
    )));
}

#[tokio::test]
async fn test_analyze_wrong_shape_is_malformed_response() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;
    mount_json(&server, "/analyze", 200, json!({ "issues": [1, 2, 3] })).await;

    let (mut controller, _events) = controller_for(&server);
    let err = controller
        .submit_upload(sample_file().await)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "MALFORMED_RESPONSE");
    assert_eq!(controller.state(), PipelineState::Idle);
}

#[tokio::test]
async fn test_process_failure_keeps_session() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;
    mount_json(&server, "/analyze", 200, json!({ "issues": { "duplicates": 1 } })).await;
    mount_json(&server, "/process", 500, json!({ "error": "boom" })).await;

    let (mut controller, _events) = controller_for(&server);
    controller.submit_upload(sample_file().await).await.unwrap();
    let err = controller.confirm_process().await.unwrap_err();

    assert_eq!(err.to_string(), "Processing failed: HTTP error! Status: 500");
    assert_eq!(controller.state(), PipelineState::ReviewingIssues);
    assert_eq!(controller.session().filename, "sample.csv");
    assert!(controller.report().is_some());
}

#[tokio::test]
async fn test_process_df_head_preview() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;
    mount_json(&server, "/analyze", 200, json!({ "issues": { "duplicates": 1 } })).await;
    mount_json(
        &server,
        "/process",
        200,
        json!({
            "download_url": "/download/cleaned_sample.csv",
            "df_head": [["id", "age"], [1, 34], [2, null]]
        }),
    )
    .await;

    let (mut controller, _events) = controller_for(&server);
    controller.submit_upload(sample_file().await).await.unwrap();
    let outcome = controller.confirm_process().await.unwrap();

    let Some(CleanedPreview::Table(table)) = outcome.preview else {
        panic!("expected a table preview");
    };
    assert_eq!(table.headers, vec!["id", "age"]);
    assert_eq!(table.rows, vec![vec!["1", "34"], vec!["2", ""]]);
}

#[tokio::test]
async fn test_visualization_failure_is_non_fatal() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;
    mount_json(&server, "/analyze", 200, json!({ "issues": { "duplicates": 2 } })).await;
    mount_json(
        &server,
        "/visualize",
        200,
        json!({ "error": "Unsupported file format for visualization" }),
    )
    .await;

    let (mut controller, _events) = controller_for(&server);
    controller.submit_upload(sample_file().await).await.unwrap();
    let err = controller.request_visualization().await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Visualization failed: Unsupported file format for visualization"
    );
    assert_eq!(controller.state(), PipelineState::ReviewingIssues);
    assert!(controller.gallery().is_empty());
}

#[tokio::test]
async fn test_slow_analysis_times_out() {
    let server = MockServer::start().await;
    mount_upload(&server, "sample.csv").await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "issues": { "duplicates": 1 } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .timeout_secs(1)
        .build()
        .unwrap();
    let mut controller = PipelineController::builder()
        .config(config)
        .build()
        .unwrap();

    let err = controller
        .submit_upload(sample_file().await)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Analysis failed: "));
    assert_eq!(controller.state(), PipelineState::Idle);
    assert!(!controller.session().is_active());
    assert!(controller.busy_label().is_none());
}

#[tokio::test]
async fn test_unsupported_extension_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "filename": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let (mut controller, _events) = controller_for(&server);
    let err = controller
        .submit_upload(UploadFile::from_bytes("notes.txt", b"hello".to_vec()))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");
    assert_eq!(controller.state(), PipelineState::Idle);
}

#[tokio::test]
async fn test_ask_assistant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "Which column has the most gaps?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "age" })))
        .mount(&server)
        .await;

    let (mut controller, _events) = controller_for(&server);
    let reply = controller
        .ask_assistant("Which column has the most gaps?")
        .await
        .unwrap();

    assert_eq!(reply, "age");
    assert_eq!(controller.state(), PipelineState::Idle);
}
