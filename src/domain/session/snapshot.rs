//! Published view of a recording session

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::state::SessionState;
use crate::domain::recording::{format_clock, ObjectUrl, RecordedBlob, RecordingFormat};

/// Category of a session failure, as shown to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionErrorKind {
    CaptureUnavailable,
    UnsupportedFormat,
    InvalidStateTransition,
    RecorderFault,
    Download,
    SessionClosed,
}

impl SessionErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CaptureUnavailable => "capture_unavailable",
            Self::UnsupportedFormat => "unsupported_format",
            Self::InvalidStateTransition => "invalid_state_transition",
            Self::RecorderFault => "recorder_fault",
            Self::Download => "download",
            Self::SessionClosed => "session_closed",
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time state of a session.
///
/// This is what presentation layers bind to: the flags, the clock string,
/// and the finished artifact if there is one.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub is_recording: bool,
    pub is_paused: bool,
    pub duration_secs: u64,
    pub formatted_duration: String,
    #[serde(skip)]
    pub recorded_blob: Option<Arc<RecordedBlob>>,
    pub recorded_url: Option<ObjectUrl>,
    pub recorded_size: Option<usize>,
    pub format: Option<RecordingFormat>,
    pub mime_type: Option<String>,
    pub chunk_count: usize,
    pub last_error: Option<SessionErrorKind>,
}

impl SessionSnapshot {
    /// Snapshot of a session at rest
    pub fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            is_recording: false,
            is_paused: false,
            duration_secs: 0,
            formatted_duration: format_clock(0),
            recorded_blob: None,
            recorded_url: None,
            recorded_size: None,
            format: None,
            mime_type: None,
            chunk_count: 0,
            last_error: None,
        }
    }

    /// Whether a finished artifact is available for download
    pub fn has_artifact(&self) -> bool {
        self.recorded_blob.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_snapshot_is_at_rest() {
        let snapshot = SessionSnapshot::idle();
        assert_eq!(snapshot.state, SessionState::Idle);
        assert!(!snapshot.is_recording);
        assert!(!snapshot.is_paused);
        assert_eq!(snapshot.formatted_duration, "00:00");
        assert!(!snapshot.has_artifact());
        assert!(snapshot.recorded_url.is_none());
    }

    #[test]
    fn serializes_without_blob_bytes() {
        let mut snapshot = SessionSnapshot::idle();
        snapshot.recorded_blob = Some(Arc::new(RecordedBlob::new(vec![1, 2, 3], "video/webm")));
        snapshot.recorded_url = Some(ObjectUrl::new("blob:abc"));
        snapshot.recorded_size = Some(3);
        snapshot.last_error = Some(SessionErrorKind::RecorderFault);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("recorded_blob").is_none());
        assert_eq!(json["recorded_url"], "blob:abc");
        assert_eq!(json["state"], "idle");
        assert_eq!(json["last_error"], "recorder_fault");
    }
}
