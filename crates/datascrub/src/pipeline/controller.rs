//! The upload → analyze → review → clean → download state machine.

use crate::config::ClientConfig;
use crate::error::{DatascrubError, Result};
use crate::pipeline::progress::{
    CancellationToken, ClosurePresenter, PipelineEvent, Presenter,
};
use crate::pipeline::state::{BusyPhase, PipelineState};
use crate::remote::{HttpRemoteService, RemoteService};
use crate::report::{AggregatedReport, ReportAggregator};
use crate::session::{UploadFile, UploadSession};
use crate::types::ProcessOutcome;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Message sent when an analysis finds nothing to clean.
pub const CLEAN_DATA_MESSAGE: &str = "No issues found in your data! Your data is clean.";

/// File name used when a download URL has no usable last segment.
const FALLBACK_DOWNLOAD_NAME: &str = "cleaned_data.csv";

/// How an analysis ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Issues were found; the controller waits in `ReviewingIssues`.
    IssuesFound(AggregatedReport),
    /// Nothing to clean; the controller is back in `Idle`.
    Clean,
}

impl AnalysisOutcome {
    pub fn has_issues(&self) -> bool {
        matches!(self, Self::IssuesFound(_))
    }
}

/// Everything a presenter may want to show, captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub state: PipelineState,
    pub busy: Option<BusyPhase>,
    pub session: UploadSession,
    pub report: Option<AggregatedReport>,
    pub outcome: Option<ProcessOutcome>,
    pub gallery: Vec<String>,
    pub last_error: Option<String>,
}

impl PipelineSnapshot {
    pub fn busy_label(&self) -> Option<&'static str> {
        self.busy.map(|phase| phase.label())
    }

    /// Whether the "clean" action should be enabled.
    pub fn can_process(&self) -> bool {
        self.state == PipelineState::ReviewingIssues && self.busy.is_none()
    }
}

/// Read-only view of a controller's state, shareable across tasks and
/// threads while an operation is in flight.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    status: Arc<RwLock<PipelineSnapshot>>,
}

impl StatusHandle {
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.status.read().clone()
    }

    pub fn state(&self) -> PipelineState {
        self.status.read().state
    }

    pub fn busy_label(&self) -> Option<&'static str> {
        self.status.read().busy_label()
    }
}

/// Shows the busy indicator for its lifetime.
///
/// Dropping the guard clears the indicator, so it is released on success,
/// failure, timeout, cancellation and when the driving future is dropped.
struct BusyGuard {
    status: Arc<RwLock<PipelineSnapshot>>,
    presenter: Option<Arc<dyn Presenter>>,
}

impl BusyGuard {
    fn acquire(
        status: &Arc<RwLock<PipelineSnapshot>>,
        presenter: &Option<Arc<dyn Presenter>>,
        phase: BusyPhase,
    ) -> Self {
        status.write().busy = Some(phase);
        if let Some(presenter) = presenter {
            presenter.present(&PipelineEvent::Busy {
                label: Some(phase.label().to_string()),
            });
        }
        Self {
            status: status.clone(),
            presenter: presenter.clone(),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.status.write().busy = None;
        if let Some(presenter) = &self.presenter {
            presenter.present(&PipelineEvent::Busy { label: None });
        }
    }
}

/// Drives one user's upload through analysis, review and cleaning.
///
/// Operations take `&mut self`, so at most one remote call is in flight per
/// controller. Create one controller per user session.
///
/// Use [`PipelineController::builder()`] to create a controller.
///
/// # Example
///
/// ```rust,ignore
/// use datascrub::{AnalysisOutcome, ClientConfig, PipelineController, UploadFile};
///
/// let mut controller = PipelineController::builder()
///     .config(ClientConfig::builder().base_url("http://localhost:5000").build()?)
///     .on_event(|event| println!("{:?}", event))
///     .build()?;
///
/// let file = UploadFile::from_path("sales.csv").await?;
/// if let AnalysisOutcome::IssuesFound(report) = controller.submit_upload(file).await? {
///     println!("{} issues", report.total_issue_count);
///     let outcome = controller.confirm_process().await?;
///     controller.download_result(None).await?;
/// }
/// ```
pub struct PipelineController {
    config: ClientConfig,
    service: Arc<dyn RemoteService>,
    presenter: Option<Arc<dyn Presenter>>,
    cancellation_token: CancellationToken,
    status: Arc<RwLock<PipelineSnapshot>>,
}

static_assertions::assert_impl_all!(PipelineController: Send, Sync);

impl PipelineController {
    /// Create a new controller builder.
    pub fn builder() -> PipelineControllerBuilder {
        PipelineControllerBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.status.read().state
    }

    pub fn busy_label(&self) -> Option<&'static str> {
        self.status.read().busy_label()
    }

    pub fn session(&self) -> UploadSession {
        self.status.read().session.clone()
    }

    pub fn report(&self) -> Option<AggregatedReport> {
        self.status.read().report.clone()
    }

    pub fn outcome(&self) -> Option<ProcessOutcome> {
        self.status.read().outcome.clone()
    }

    pub fn gallery(&self) -> Vec<String> {
        self.status.read().gallery.clone()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.status.read().clone()
    }

    /// Handle for observing this controller from other tasks.
    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle {
            status: self.status.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Upload a file and analyze it.
    ///
    /// Valid from `Idle` and `Completed`. On failure the session is cleared
    /// and the controller passes through `Error` back to `Idle`.
    ///
    /// This starts a new run: a cancellation left over from the previous run
    /// is cleared. Every later operation of the run fails with
    /// [`DatascrubError::Cancelled`] once the token is cancelled.
    pub async fn submit_upload(&mut self, file: UploadFile) -> Result<AnalysisOutcome> {
        let state = self.state();
        if !state.accepts_upload() {
            return Err(invalid_state("upload a file", state));
        }

        self.cancellation_token.reset();
        {
            let mut status = self.status.write();
            status.session.clear();
            status.report = None;
            status.outcome = None;
            status.gallery.clear();
            status.last_error = None;
        }
        self.transition(PipelineState::Uploading);

        if !self.config.is_allowed_file(file.name()) {
            let err = DatascrubError::UnsupportedFileType(file.name().to_string());
            return Err(self.fail_and_reset(BusyPhase::Uploading, err));
        }

        info!("Uploading {} ({} bytes)", file.name(), file.size_bytes());
        let filename = match self
            .call(BusyPhase::Uploading, self.service.upload(&file))
            .await
        {
            Ok(filename) if filename.trim().is_empty() => {
                let err =
                    DatascrubError::MalformedResponse("server returned an empty filename".into());
                return Err(self.fail_and_reset(BusyPhase::Uploading, err));
            }
            Ok(filename) => filename,
            Err(e) => return Err(self.fail_and_reset(BusyPhase::Uploading, e)),
        };

        info!("Upload accepted as '{}'", filename);
        self.status.write().session = UploadSession::start(filename, &file);
        self.transition(PipelineState::Analyzing);

        self.analyze_current().await
    }

    /// Analyze the uploaded file.
    ///
    /// [`submit_upload`](Self::submit_upload) runs this automatically; call it
    /// directly only to resume an analysis whose driving future was dropped.
    pub async fn run_analysis(&mut self) -> Result<AnalysisOutcome> {
        let state = self.state();
        if state != PipelineState::Analyzing {
            return Err(invalid_state("run an analysis", state));
        }
        self.analyze_current().await
    }

    async fn analyze_current(&mut self) -> Result<AnalysisOutcome> {
        let filename = self.status.read().session.filename.clone();
        if filename.is_empty() {
            return Err(self.fail_and_reset(BusyPhase::Analyzing, DatascrubError::NoActiveUpload));
        }

        let result = self
            .call(BusyPhase::Analyzing, self.service.analyze(&filename))
            .await
            .and_then(|issues| ReportAggregator::aggregate(&issues));

        let report = match result {
            Ok(report) => report,
            Err(e) => return Err(self.fail_and_reset(BusyPhase::Analyzing, e)),
        };

        self.status.write().report = Some(report.clone());

        if report.has_issues {
            info!(
                "Found {} issues in {} categories",
                report.total_issue_count,
                report.summaries.len()
            );
            self.transition(PipelineState::ReviewingIssues);
            self.emit(PipelineEvent::IssuesFound {
                report: report.clone(),
            });
            Ok(AnalysisOutcome::IssuesFound(report))
        } else {
            info!("No issues found in '{}'", filename);
            self.transition(PipelineState::Idle);
            self.emit(PipelineEvent::CleanData {
                message: CLEAN_DATA_MESSAGE.to_string(),
            });
            Ok(AnalysisOutcome::Clean)
        }
    }

    /// Ask the service to clean the uploaded file.
    ///
    /// Only valid from `ReviewingIssues`. A failure returns the controller
    /// to `ReviewingIssues` with the session and report intact. A cancelled
    /// run is refused before anything is sent.
    pub async fn confirm_process(&mut self) -> Result<ProcessOutcome> {
        let state = self.state();
        if state != PipelineState::ReviewingIssues {
            return Err(invalid_state("clean the data", state));
        }
        let filename = self.status.read().session.filename.clone();
        if filename.is_empty() {
            return Err(DatascrubError::NoActiveUpload);
        }
        if self.cancellation_token.is_cancelled() {
            info!("Run was cancelled, not cleaning '{}'", filename);
            return Err(DatascrubError::Cancelled);
        }

        self.transition(PipelineState::Processing);

        match self
            .call(BusyPhase::Processing, self.service.process(&filename))
            .await
        {
            Ok(outcome) => {
                info!(
                    "Cleaning finished; {} methods applied",
                    outcome.applied_methods.len()
                );
                {
                    let mut status = self.status.write();
                    status.outcome = Some(outcome.clone());
                    status.last_error = None;
                }
                self.transition(PipelineState::Completed);
                self.emit(PipelineEvent::Completed {
                    outcome: outcome.clone(),
                });
                Ok(outcome)
            }
            Err(e) => {
                let err = self.record_failure(BusyPhase::Processing, e, true);
                self.transition(PipelineState::ReviewingIssues);
                Err(err)
            }
        }
    }

    /// Forget the upload, report and results and return to `Idle`.
    ///
    /// Valid from any state; a second call in a row changes nothing.
    pub fn reset_upload(&mut self) {
        {
            let mut status = self.status.write();
            status.session.clear();
            status.report = None;
            status.outcome = None;
            status.gallery.clear();
            status.last_error = None;
        }
        self.transition(PipelineState::Idle);
    }

    /// Request "before" plots for the uploaded file and append them to the
    /// gallery. Never changes the pipeline state.
    pub async fn request_visualization(&mut self) -> Result<Vec<String>> {
        let filename = self.status.read().session.filename.clone();
        if filename.is_empty() {
            return Err(DatascrubError::NoActiveUpload);
        }

        match self
            .call(BusyPhase::Visualizing, self.service.visualize(&filename))
            .await
        {
            Ok(urls) => {
                debug!("Received {} plots", urls.len());
                self.status.write().gallery.extend(urls.iter().cloned());
                self.emit(PipelineEvent::PlotsAdded { urls: urls.clone() });
                Ok(urls)
            }
            Err(e) => Err(self.record_failure(BusyPhase::Visualizing, e, true)),
        }
    }

    /// Download the cleaned file into `dest_dir` (or the configured download
    /// directory). Only valid from `Completed`; failures leave it there.
    pub async fn download_result(&mut self, dest_dir: Option<&Path>) -> Result<PathBuf> {
        let state = self.state();
        let outcome = self.status.read().outcome.clone();
        let Some(outcome) = outcome.filter(|_| state == PipelineState::Completed) else {
            return Err(invalid_state("download the cleaned file", state));
        };

        let dir = dest_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.download_dir.clone());
        let path = dir.join(download_file_name(&outcome.download_url));

        let result = async {
            let bytes = self
                .call(BusyPhase::Downloading, self.service.download(&outcome.download_url))
                .await?;
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(&path, &bytes).await?;
            Ok::<_, DatascrubError>(bytes.len())
        }
        .await;

        match result {
            Ok(len) => {
                info!("Saved cleaned data to {} ({} bytes)", path.display(), len);
                self.emit(PipelineEvent::Downloaded { path: path.clone() });
                Ok(path)
            }
            Err(e) => Err(self.record_failure(BusyPhase::Downloading, e, true)),
        }
    }

    /// Ask the service's assistant a question. Never changes the pipeline
    /// state.
    pub async fn ask_assistant(&mut self, message: &str) -> Result<String> {
        match self
            .call(BusyPhase::Chatting, self.service.chat(message))
            .await
        {
            Ok(reply) => {
                self.emit(PipelineEvent::AssistantReply {
                    reply: reply.clone(),
                });
                Ok(reply)
            }
            Err(e) => Err(self.record_failure(BusyPhase::Chatting, e, true)),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Run one remote call under the busy indicator, bounded by the
    /// configured timeout and the cancellation token.
    async fn call<T, F>(&self, phase: BusyPhase, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _busy = BusyGuard::acquire(&self.status, &self.presenter, phase);
        debug!("{} via {}", phase.label(), self.service.name());

        tokio::select! {
            biased;
            _ = self.cancellation_token.cancelled() => Err(DatascrubError::Cancelled),
            result = tokio::time::timeout(self.config.timeout(), request) => match result {
                Ok(result) => result,
                Err(_) => Err(DatascrubError::Timeout {
                    operation: phase.operation().to_string(),
                    secs: self.config.timeout_secs,
                }),
            },
        }
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(presenter) = &self.presenter {
            presenter.present(&event);
        }
    }

    fn transition(&self, to: PipelineState) {
        let from = {
            let mut status = self.status.write();
            let from = status.state;
            if from == to {
                return;
            }
            if !from.can_transition_to(to) {
                warn!("Unexpected pipeline transition {} -> {}", from, to);
            }
            status.state = to;
            from
        };
        debug!("Pipeline {} -> {}", from, to);
        self.emit(PipelineEvent::StateChanged { from, to });
    }

    /// Attach the user-facing prefix, remember and report the failure.
    fn record_failure(
        &self,
        phase: BusyPhase,
        err: DatascrubError,
        recoverable: bool,
    ) -> DatascrubError {
        let err = err.with_context(phase.failure_prefix());
        let message = err.to_string();
        if recoverable {
            warn!("{}", message);
        } else {
            error!("{}", message);
        }
        self.status.write().last_error = Some(message.clone());
        self.emit(PipelineEvent::Failed {
            operation: phase.operation().to_string(),
            message,
            recoverable,
        });
        err
    }

    /// Upload and analysis failures discard the whole session.
    fn fail_and_reset(&self, phase: BusyPhase, err: DatascrubError) -> DatascrubError {
        self.transition(PipelineState::Error);
        let err = self.record_failure(phase, err, false);
        {
            let mut status = self.status.write();
            status.session.clear();
            status.report = None;
            status.outcome = None;
            status.gallery.clear();
        }
        self.transition(PipelineState::Idle);
        err
    }
}

fn invalid_state(operation: &str, state: PipelineState) -> DatascrubError {
    DatascrubError::InvalidState {
        operation: operation.to_string(),
        state: state.display_name().to_string(),
    }
}

/// Last path segment of a download URL, without query or fragment.
fn download_file_name(download_url: &str) -> String {
    let path = download_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_DOWNLOAD_NAME)
        .to_string()
}

/// Builder for [`PipelineController`].
#[derive(Default)]
pub struct PipelineControllerBuilder {
    config: Option<ClientConfig>,
    service: Option<Arc<dyn RemoteService>>,
    presenter: Option<Arc<dyn Presenter>>,
    cancellation_token: Option<CancellationToken>,
}

impl PipelineControllerBuilder {
    /// Set the client configuration. Defaults to [`ClientConfig::default()`].
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the remote service. Defaults to an [`HttpRemoteService`] built
    /// from the configuration.
    pub fn service(mut self, service: Arc<dyn RemoteService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Set a presenter for receiving pipeline events.
    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Set an event callback closure.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.presenter = Some(Arc::new(ClosurePresenter::new(callback)));
        self
    }

    /// Set a cancellation token for aborting the call in flight.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Returns [`DatascrubError::InvalidConfig`] if the configuration does not
    /// validate or the default HTTP service cannot be created.
    pub fn build(self) -> Result<PipelineController> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let service: Arc<dyn RemoteService> = match self.service {
            Some(service) => service,
            None => Arc::new(HttpRemoteService::new(&config)?),
        };

        Ok(PipelineController {
            config,
            service,
            presenter: self.presenter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            status: Arc::new(RwLock::new(PipelineSnapshot::default())),
        })
    }
}
