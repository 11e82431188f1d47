//! Pipeline states and busy phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the upload → analyze → review → clean flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing in flight; ready for a new upload.
    #[default]
    Idle,
    /// File is being sent to the service.
    Uploading,
    /// Issue report is being computed.
    Analyzing,
    /// Issues were found and wait for the user's go-ahead.
    ReviewingIssues,
    /// Service is cleaning the file.
    Processing,
    /// Cleaned file is ready for download.
    Completed,
    /// Upload or analysis failed; always resolves to `Idle`.
    Error,
}

impl PipelineState {
    /// Returns a human-readable name for the state.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Analyzing => "analyzing",
            Self::ReviewingIssues => "reviewing issues",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "in error",
        }
    }

    /// States a new upload may start from.
    pub fn accepts_upload(&self) -> bool {
        matches!(self, Self::Idle | Self::Completed | Self::Error)
    }

    /// Whether the controller may move from `self` to `next`.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        match (self, next) {
            // reset is always allowed
            (_, Idle) => true,
            (Idle | Completed | Error, Uploading) => true,
            (Uploading, Analyzing) => true,
            (Analyzing, ReviewingIssues) => true,
            (ReviewingIssues, Processing) => true,
            (Processing, Completed | ReviewingIssues) => true,
            (state, Error) => *state != Idle,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Label of the single remote call in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPhase {
    Uploading,
    Analyzing,
    Processing,
    Visualizing,
    Downloading,
    Chatting,
}

impl BusyPhase {
    /// Text shown next to the spinner.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uploading => "Analyzing your data...",
            Self::Analyzing => "Analyzing data quality issues...",
            Self::Processing => "Cleaning your data...",
            Self::Visualizing => "Generating visualizations...",
            Self::Downloading => "Downloading cleaned data...",
            Self::Chatting => "Waiting for the assistant...",
        }
    }

    /// Operation name used in errors and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Uploading => "upload",
            Self::Analyzing => "analysis",
            Self::Processing => "processing",
            Self::Visualizing => "visualization",
            Self::Downloading => "download",
            Self::Chatting => "assistant request",
        }
    }

    /// Prefix put in front of user-facing failure messages.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Self::Uploading => "Upload failed",
            Self::Analyzing => "Analysis failed",
            Self::Processing => "Processing failed",
            Self::Visualizing => "Visualization failed",
            Self::Downloading => "Download failed",
            Self::Chatting => "Assistant request failed",
        }
    }
}
