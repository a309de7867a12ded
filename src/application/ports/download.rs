//! Download port interface

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::{ObjectUrl, RecordedBlob};

/// Download errors
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("Invalid download filename: \"{0}\"")]
    InvalidFilename(String),

    #[error("No download directory available")]
    NoLocation,

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("Recording is no longer available at {0}")]
    UnresolvedUrl(String),
}

/// Port for saving a finished artifact under a filename
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save the artifact behind `url`.
    ///
    /// # Arguments
    /// * `url` - Reference the artifact was published under
    /// * `blob` - The artifact bytes
    /// * `filename` - Requested file name (no directories)
    ///
    /// # Returns
    /// Where the artifact ended up
    async fn save(
        &self,
        url: &ObjectUrl,
        blob: &RecordedBlob,
        filename: &str,
    ) -> Result<PathBuf, DownloadError>;
}
