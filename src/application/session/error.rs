//! Recording session errors

use thiserror::Error;

use crate::application::ports::{CaptureError, DownloadError, RecorderError};
use crate::domain::session::{InvalidStateTransition, SessionErrorKind};

/// Errors from the recording session
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(#[from] CaptureError),

    #[error("Unsupported recording format: {mime_type}")]
    UnsupportedFormat { mime_type: String },

    #[error(transparent)]
    InvalidStateTransition(#[from] InvalidStateTransition),

    #[error("Recorder fault: {0}")]
    RecorderFault(RecorderError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Recording session has shut down")]
    SessionClosed,
}

impl SessionError {
    /// Category of this error
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            Self::CaptureUnavailable(_) => SessionErrorKind::CaptureUnavailable,
            Self::UnsupportedFormat { .. } => SessionErrorKind::UnsupportedFormat,
            Self::InvalidStateTransition(_) => SessionErrorKind::InvalidStateTransition,
            Self::RecorderFault(_) => SessionErrorKind::RecorderFault,
            Self::Download(_) => SessionErrorKind::Download,
            Self::SessionClosed => SessionErrorKind::SessionClosed,
        }
    }
}

impl From<RecorderError> for SessionError {
    fn from(error: RecorderError) -> Self {
        match error {
            RecorderError::UnsupportedMimeType(mime_type) => Self::UnsupportedFormat { mime_type },
            other => Self::RecorderFault(other),
        }
    }
}
