//! Error types for the cleaning-service client.
//!
//! This module provides a single error hierarchy using `thiserror` covering
//! transport failures, server-reported failures, malformed reports and the
//! controller's own state checks.
//!
//! Errors are serializable so a UI front-end can receive them as
//! `{ "code": ..., "message": ... }` objects.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the client.
#[derive(Error, Debug)]
pub enum DatascrubError {
    /// Non-2xx response or network-level failure.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// 2xx response whose body carried an `error` field.
    #[error("{0}")]
    ServerReported(String),

    /// Issue report that violates the expected schema.
    #[error("Malformed issue report: {0}")]
    MalformedReport(String),

    /// Response body that does not have the expected shape.
    #[error("Malformed server response: {0}")]
    MalformedResponse(String),

    /// Remote call exceeded the configured timeout.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// In-flight call was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation is not allowed in the controller's current state.
    #[error("Cannot {operation} while {state}")]
    InvalidState { operation: String, state: String },

    /// Operation requires an uploaded file.
    #[error("No file has been uploaded")]
    NoActiveUpload,

    /// File extension is not in the allowed set.
    #[error("Invalid file type: {0}")]
    UnsupportedFileType(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DatascrubError>,
    },
}

impl DatascrubError {
    /// Build a transport error for a non-2xx HTTP status.
    pub fn http_status(status: u16) -> Self {
        Self::Transport {
            status: Some(status),
            message: format!("HTTP error! Status: {}", status),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DatascrubError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::ServerReported(_) => "SERVER_ERROR",
            Self::MalformedReport(_) => "MALFORMED_REPORT",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::NoActiveUpload => "NO_ACTIVE_UPLOAD",
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// HTTP status carried by a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::WithContext { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DatascrubError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = match status {
            Some(code) => format!("HTTP error! Status: {}", code),
            None => err.to_string(),
        };
        DatascrubError::Transport { status, message }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for DatascrubError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DatascrubError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, DatascrubError>;
