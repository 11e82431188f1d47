//! Data Cleaning Service Client
//!
//! A client library for a remote data-quality service: upload a tabular file,
//! review the detected issues, have the server clean the data and download the
//! result.
//!
//! # Overview
//!
//! This library provides:
//!
//! - **Issue Aggregation**: Turns the server's raw issue report into ordered,
//!   counted category summaries with badge styles
//! - **Pipeline Controller**: Async state machine for
//!   upload → analyze → review → clean → download
//! - **Remote Service**: HTTP client for the service endpoints, behind a trait
//! - **Rendering**: HTML fragments and terminal text for aggregated reports
//! - **Progress Events**: Presenter callbacks, busy labels and cancellation
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use datascrub::{AnalysisOutcome, ClientConfig, PipelineController, UploadFile};
//!
//! let config = ClientConfig::builder()
//!     .base_url("http://localhost:5000")
//!     .timeout_secs(30)
//!     .build()?;
//!
//! let mut controller = PipelineController::builder()
//!     .config(config)
//!     .on_event(|event| println!("{:?}", event))
//!     .build()?;
//!
//! let file = UploadFile::from_path("data.csv").await?;
//! match controller.submit_upload(file).await? {
//!     AnalysisOutcome::IssuesFound(report) => {
//!         println!("{}", datascrub::render::text::report(&report));
//!         let outcome = controller.confirm_process().await?;
//!         let path = controller.download_result(None).await?;
//!         println!("Saved to {}", path.display());
//!     }
//!     AnalysisOutcome::Clean => println!("Nothing to clean"),
//! }
//! ```
//!
//! # Aggregating a report directly
//!
//! [`ReportAggregator`] does no I/O and can be used on its own:
//!
//! ```rust,ignore
//! use datascrub::{IssueReport, ReportAggregator};
//!
//! let issues = IssueReport::from_value(serde_json::json!({
//!     "duplicates": 5,
//!     "missing": {"age": 3}
//! }))?;
//! let report = ReportAggregator::aggregate(&issues)?;
//!
//! assert_eq!(report.total_issue_count, 6);
//! assert_eq!(report.summaries[0].display_name, "Missing Values");
//! ```
//!
//! # Custom transports
//!
//! Implement [`remote::RemoteService`] and pass it to
//! [`PipelineControllerBuilder::service`] to drive the controller against
//! something other than the HTTP endpoints, e.g. in tests.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod remote;
pub mod render;
pub mod report;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use config::{ClientConfig, ClientConfigBuilder, ConfigValidationError};
pub use error::{DatascrubError, Result as DatascrubResult};
pub use pipeline::{
    AnalysisOutcome, BusyPhase, CancellationToken, ClosurePresenter, PipelineController,
    PipelineControllerBuilder, PipelineEvent, PipelineSnapshot, PipelineState, Presenter,
    StatusHandle,
};
pub use remote::{HttpRemoteService, RemoteService};
pub use report::{
    AggregatedReport, BadgeStyle, CategorySummary, DetailFragment, IssueCategory, KnownCategory,
    ReportAggregator,
};
pub use session::{UploadFile, UploadSession, format_file_size};
pub use types::{CleanedPreview, IssueReport, PreviewTable, ProcessOutcome};
