//! Remote cleaning-service abstraction.
//!
//! The [`RemoteService`] trait is the seam between the pipeline controller
//! and the HTTP endpoints. [`HttpRemoteService`] talks to a real server;
//! tests and alternative transports implement the trait directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use datascrub::remote::{HttpRemoteService, RemoteService};
//! use datascrub::ClientConfig;
//!
//! let service = HttpRemoteService::new(&ClientConfig::default())?;
//! let issues = service.analyze("sales.csv").await?;
//! ```

mod http;

pub use http::HttpRemoteService;

use crate::error::Result;
use crate::session::UploadFile;
use crate::types::{IssueReport, ProcessOutcome};
use async_trait::async_trait;

/// Operations the cleaning service offers.
///
/// Implementations unwrap the service's `{ "error": ... }` envelope into
/// [`DatascrubError::ServerReported`](crate::DatascrubError::ServerReported)
/// and map non-2xx responses to
/// [`DatascrubError::Transport`](crate::DatascrubError::Transport).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one service can be shared by
/// several controllers through an `Arc`.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Send a file; returns the server-assigned filename.
    async fn upload(&self, file: &UploadFile) -> Result<String>;

    /// Request the issue report for an uploaded file.
    async fn analyze(&self, filename: &str) -> Result<IssueReport>;

    /// Clean an uploaded file.
    async fn process(&self, filename: &str) -> Result<ProcessOutcome>;

    /// Request "before" plots; returns image URLs.
    async fn visualize(&self, filename: &str) -> Result<Vec<String>>;

    /// Ask the service's assistant a question about the analysed file.
    async fn chat(&self, message: &str) -> Result<String>;

    /// Fetch the contents behind a download URL returned by `process`.
    async fn download(&self, download_url: &str) -> Result<Vec<u8>>;

    /// Name used in logs.
    fn name(&self) -> &str;
}
