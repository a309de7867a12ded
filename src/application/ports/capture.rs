//! Capture port interfaces

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::recording::RecordingOptions;

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Screen capture permission denied: {0}")]
    PermissionDenied(String),

    #[error("No display available to capture")]
    NoDisplay,

    #[error("Capture backend not found: {0}")]
    BackendNotFound(String),

    #[error("Failed to acquire capture stream: {0}")]
    AcquireFailed(String),
}

/// Requested video shape. Unset fields let the host decide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<u32>,
}

/// Constraints passed to the host when acquiring a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub video: VideoConstraints,
    pub audio: bool,
}

impl CaptureConstraints {
    /// Build constraints from recording options
    pub fn from_options(options: &RecordingOptions) -> Self {
        Self {
            video: VideoConstraints {
                width: options.width,
                height: options.height,
                frame_rate: Some(options.frame_rate_or_default()),
            },
            audio: options.audio_or_default(),
        }
    }
}

/// Kind of media a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Lifecycle of a single track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Live,
    Ended,
}

/// Description of one track of a capture stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
    pub state: TrackState,
}

/// A live capture stream owned by one session at a time.
///
/// Stopping the tracks is the only way to release the host capture (and
/// its on-screen indicator), so implementations must make it idempotent.
pub trait CaptureStream: Send + Sync + 'static {
    /// Stable identifier of the stream
    fn id(&self) -> &str;

    /// Current track list
    fn tracks(&self) -> Vec<TrackInfo>;

    /// Stop every constituent track
    fn stop_all_tracks(&self);

    /// Whether any track is still live
    fn is_active(&self) -> bool {
        self.tracks().iter().any(|t| t.state == TrackState::Live)
    }
}

/// Port for acquiring capture streams from the host
#[async_trait]
pub trait CaptureSource: Send + Sync + 'static {
    type Stream: CaptureStream;

    /// Request a capture stream.
    ///
    /// # Arguments
    /// * `constraints` - Requested video shape and whether to include audio
    ///
    /// # Returns
    /// The live stream, or an error if the host refused or cannot capture
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<Self::Stream, CaptureError>;
}
