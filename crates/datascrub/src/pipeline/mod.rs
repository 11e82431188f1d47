//! Pipeline orchestration.
//!
//! The [`PipelineController`] owns one upload session and walks it through
//! upload, analysis, review, cleaning and download, emitting
//! [`PipelineEvent`]s to a [`Presenter`] as it goes.

mod controller;
mod progress;
mod state;

pub use controller::{
    AnalysisOutcome, CLEAN_DATA_MESSAGE, PipelineController, PipelineControllerBuilder,
    PipelineSnapshot, StatusHandle,
};
pub use progress::{CancellationToken, ClosurePresenter, PipelineEvent, Presenter};
pub use state::{BusyPhase, PipelineState};
