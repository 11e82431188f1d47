//! Pipeline events and cancellation support.
//!
//! This module provides the event stream a presenter (terminal, web view,
//! desktop shell) renders, and a token for cancelling the call in flight.
//!
//! # Example
//!
//! ```rust,ignore
//! use datascrub::{CancellationToken, PipelineController, PipelineEvent};
//!
//! let token = CancellationToken::new();
//! let token_clone = token.clone();
//!
//! tokio::spawn(async move {
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     token_clone.cancel();
//! });
//!
//! let mut controller = PipelineController::builder()
//!     .service(service)
//!     .cancellation_token(token)
//!     .on_event(|event| {
//!         if let PipelineEvent::Busy { label: Some(label) } = event {
//!             println!("{}", label);
//!         }
//!     })
//!     .build()?;
//! ```

use crate::pipeline::state::PipelineState;
use crate::report::AggregatedReport;
use crate::types::ProcessOutcome;
use serde::{Deserialize, Serialize};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Something a presenter should show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The pipeline moved between states.
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },
    /// Busy indicator changed; `None` hides it.
    Busy { label: Option<String> },
    /// Analysis found issues to review.
    IssuesFound { report: AggregatedReport },
    /// Analysis found nothing to clean.
    CleanData { message: String },
    /// An operation failed.
    Failed {
        operation: String,
        message: String,
        /// `true` when the session survived the failure.
        recoverable: bool,
    },
    /// Cleaning finished.
    Completed { outcome: ProcessOutcome },
    /// Plots were appended to the gallery.
    PlotsAdded { urls: Vec<String> },
    /// Cleaned file was written to disk.
    Downloaded { path: PathBuf },
    /// The assistant answered a question.
    AssistantReply { reply: String },
}

/// Receiver of pipeline events.
///
/// Implementations must be `Send + Sync`; events are delivered from
/// whichever task drives the controller.
///
/// # Example
///
/// ```rust,ignore
/// use datascrub::{PipelineEvent, Presenter};
///
/// struct LogPresenter;
///
/// impl Presenter for LogPresenter {
///     fn present(&self, event: &PipelineEvent) {
///         tracing::info!("{:?}", event);
///     }
/// }
/// ```
pub trait Presenter: Send + Sync {
    /// Called for every event. Should return quickly.
    fn present(&self, event: &PipelineEvent);
}

/// Wrapper that implements [`Presenter`] using a closure.
pub struct ClosurePresenter<F>
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    callback: F,
}

impl<F> ClosurePresenter<F>
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> Presenter for ClosurePresenter<F>
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn present(&self, event: &PipelineEvent) {
        (self.callback)(event);
    }
}

/// Token for cancelling the remote calls of a pipeline run.
///
/// Clones share state. Call [`cancel()`](Self::cancel) from any task or
/// thread; the controller aborts its current call with
/// [`DatascrubError::Cancelled`](crate::DatascrubError::Cancelled) and
/// refuses to start further calls until a new upload begins.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    current: Arc<RwLock<tokio_util::sync::CancellationToken>>,
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(PipelineEvent: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Wakes every task waiting in
    /// [`cancelled()`](Self::cancelled).
    pub fn cancel(&self) {
        self.current.read().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.read().is_cancelled()
    }

    /// Swap in a fresh token if this one was cancelled, so it can guard
    /// another run.
    pub fn reset(&self) {
        let mut current = self.current.write();
        if current.is_cancelled() {
            *current = tokio_util::sync::CancellationToken::new();
        }
    }

    /// Resolves once [`cancel()`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let token = self.current.read().clone();
        token.cancelled().await;
    }
}
