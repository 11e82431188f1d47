//! Configuration types for the cleaning-service client.
//!
//! This module provides configuration options using the builder pattern,
//! plus loading from environment variables for the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default address of the cleaning service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default timeout for every remote call in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// File extensions the cleaning service accepts.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["csv", "xlsx", "pdf", "sql"];

const ENV_BASE_URL: &str = "DATASCRUB_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "DATASCRUB_TIMEOUT_SECS";
const ENV_DOWNLOAD_DIR: &str = "DATASCRUB_DOWNLOAD_DIR";

/// Configuration for the client and pipeline controller.
///
/// Use [`ClientConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use datascrub::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:5000")
///     .timeout_secs(30)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the cleaning service (scheme, host, optional port).
    /// Default: "http://127.0.0.1:5000"
    pub base_url: String,

    /// Timeout applied to every remote call, in seconds.
    /// Default: 60
    pub timeout_secs: u64,

    /// Lower-case file extensions accepted for upload.
    /// Default: csv, xlsx, pdf, sql
    pub allowed_extensions: Vec<String>,

    /// Directory the cleaned file is downloaded into.
    /// Default: "downloads"
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            allowed_extensions: default_extensions(),
            download_dir: PathBuf::from("downloads"),
        }
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Build a configuration from `DATASCRUB_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        let mut builder = Self::builder();

        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigValidationError::InvalidEnvValue {
                    name: ENV_TIMEOUT_SECS.to_string(),
                    value: raw.clone(),
                })?;
            builder = builder.timeout_secs(secs);
        }
        if let Ok(dir) = std::env::var(ENV_DOWNLOAD_DIR) {
            builder = builder.download_dir(dir);
        }

        builder.build()
    }

    /// The per-call timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether `file_name` has an allowed extension (case-insensitive).
    pub fn is_allowed_file(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigValidationError::InvalidBaseUrl(self.base_url.clone()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout(self.timeout_secs));
        }

        if self.allowed_extensions.is_empty() {
            return Err(ConfigValidationError::NoAllowedExtensions);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid base URL: '{0}' (must start with http:// or https://)")]
    InvalidBaseUrl(String),

    #[error("Invalid timeout: {0}s (must be at least 1)")]
    InvalidTimeout(u64),

    #[error("At least one allowed file extension is required")]
    NoAllowedExtensions,

    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnvValue { name: String, value: String },
}

impl From<ConfigValidationError> for crate::error::DatascrubError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::DatascrubError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`ClientConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    allowed_extensions: Option<Vec<String>>,
    download_dir: Option<PathBuf>,
}

impl ClientConfigBuilder {
    /// Set the service base URL. A trailing slash is dropped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Set the timeout for each remote call in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Replace the set of allowed upload extensions.
    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = Some(
            extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        );
        self
    }

    /// Set the directory the cleaned file is downloaded into.
    pub fn download_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ClientConfig` or an error if validation fails.
    pub fn build(self) -> Result<ClientConfig, ConfigValidationError> {
        let config = ClientConfig {
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            allowed_extensions: self.allowed_extensions.unwrap_or_else(default_extensions),
            download_dir: self
                .download_dir
                .unwrap_or_else(|| PathBuf::from("downloads")),
        };

        config.validate()?;
        Ok(config)
    }
}
