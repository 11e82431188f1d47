//! Upload session state.
//!
//! An [`UploadSession`] holds the server-assigned identity of the file the
//! user is currently working on. It is owned by one
//! [`PipelineController`](crate::pipeline::PipelineController), never global.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A file picked by the user, ready to be sent to `/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadFile {
    /// Wrap in-memory contents under the given file name.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. The upload name is the path's file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The currently active uploaded artifact.
///
/// An empty `filename` means there is no active upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    /// Identity the server assigned to the upload.
    pub filename: String,
    /// Name of the file as picked by the user.
    pub original_name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    /// Session for a file the server accepted under `filename`.
    pub fn start(filename: impl Into<String>, file: &UploadFile) -> Self {
        Self {
            filename: filename.into(),
            original_name: file.name().to_string(),
            size_bytes: file.size_bytes(),
            uploaded_at: Some(Utc::now()),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.filename.is_empty()
    }

    /// Forget the active upload.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn formatted_size(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

/// Human-readable file size: base 1024, up to two decimals, trailing zeros
/// trimmed (`1536` → `"1.5 KB"`).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit < UNITS.len() - 1 && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / scale as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
    }

    #[test]
    fn test_format_file_size_caps_at_gigabytes() {
        assert_eq!(format_file_size(2 * 1024 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_session_lifecycle() {
        let file = UploadFile::from_bytes("sales.csv", b"a,b\n1,2\n".to_vec());
        let mut session = UploadSession::start("sales.csv", &file);

        assert!(session.is_active());
        assert_eq!(session.original_name, "sales.csv");
        assert_eq!(session.size_bytes, 8);
        assert!(session.uploaded_at.is_some());

        session.clear();
        assert!(!session.is_active());
        assert_eq!(session, UploadSession::default());
    }

    #[tokio::test]
    async fn test_upload_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.csv");
        std::fs::write(&path, "q1,q2\nyes,no\n").unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.name(), "survey.csv");
        assert_eq!(file.size_bytes(), 13);
    }

    #[tokio::test]
    async fn test_upload_file_missing_path_is_io_error() {
        let err = UploadFile::from_path("/definitely/not/here.csv")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
