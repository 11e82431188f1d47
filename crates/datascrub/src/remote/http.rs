//! HTTP implementation of [`RemoteService`] built on `reqwest`.

use super::RemoteService;
use crate::config::ClientConfig;
use crate::error::{DatascrubError, Result};
use crate::session::UploadFile;
use crate::types::{
    AnalyzeResponse, ChatRequest, ChatResponse, FilenameRequest, IssueReport, ProcessOutcome,
    ProcessResponse, UploadResponse, VisualizeResponse, decode_reply,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Cleaning service reached over HTTP.
///
/// # Example
///
/// ```rust,ignore
/// use datascrub::remote::HttpRemoteService;
/// use datascrub::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:5000")
///     .timeout_secs(30)
///     .build()?;
/// let service = HttpRemoteService::new(&config)?;
/// ```
pub struct HttpRemoteService {
    client: Client,
    base_url: Url,
}

impl HttpRemoteService {
    /// Create a service for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DatascrubError::InvalidConfig`] if the base URL does not
    /// parse or the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                DatascrubError::InvalidConfig(format!("Failed to build HTTP client: {}", e))
            })?;

        // Trailing slash so relative endpoints join below any path prefix.
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|e| {
                DatascrubError::InvalidConfig(format!(
                    "Invalid base URL '{}': {}",
                    config.base_url, e
                ))
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint or download URL against the base URL.
    ///
    /// Root-relative paths (`/download/x.csv`) resolve against the host,
    /// bare names (`upload`) against the base path, absolute URLs as-is.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DatascrubError::MalformedResponse(format!("Invalid URL '{}': {}", path, e)))
    }

    async fn read_json(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            warn!("Cleaning service answered {}", status);
            return Err(DatascrubError::http_status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DatascrubError::MalformedResponse(e.to_string()))
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.resolve(endpoint)?;
        debug!("POST {}", url);

        let response = self.client.post(url).json(body).send().await?;
        decode_reply(Self::read_json(response).await?)
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn upload(&self, file: &UploadFile) -> Result<String> {
        let url = self.resolve("upload")?;
        debug!("POST {} ({} bytes)", url, file.size_bytes());

        let part = Part::bytes(file.bytes().to_vec()).file_name(file.name().to_string());
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let reply: UploadResponse = decode_reply(Self::read_json(response).await?)?;
        Ok(reply.filename)
    }

    async fn analyze(&self, filename: &str) -> Result<IssueReport> {
        let reply: AnalyzeResponse = self
            .post_json("analyze", &FilenameRequest { filename })
            .await?;
        Ok(reply.issues)
    }

    async fn process(&self, filename: &str) -> Result<ProcessOutcome> {
        let reply: ProcessResponse = self
            .post_json("process", &FilenameRequest { filename })
            .await?;
        Ok(reply.into())
    }

    async fn visualize(&self, filename: &str) -> Result<Vec<String>> {
        let reply: VisualizeResponse = self
            .post_json("visualize", &FilenameRequest { filename })
            .await?;
        Ok(reply.before_plot)
    }

    async fn chat(&self, message: &str) -> Result<String> {
        let reply: ChatResponse = self.post_json("chat", &ChatRequest { message }).await?;
        Ok(reply.reply)
    }

    async fn download(&self, download_url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(download_url)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DatascrubError::http_status(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}
