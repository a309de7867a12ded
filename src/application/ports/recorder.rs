//! Recorder port interfaces

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use super::capture::CaptureStream;
use crate::domain::recording::RecordingOptions;

/// Recorder errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("Failed to start recorder: {0}")]
    StartFailed(String),

    #[error("Recorder cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: RecorderState,
    },

    #[error("Recorder failed: {0}")]
    Fault(String),
}

/// State of the host recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Inactive,
    Recording,
    Paused,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inactive => "inactive",
            Self::Recording => "recording",
            Self::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Notifications emitted by a recorder, in emission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// A fragment of the container stream
    DataAvailable(Vec<u8>),
    /// The recorder finished; no more data follows
    Stopped,
    /// The recorder failed; no more data follows
    Errored(RecorderError),
}

/// Receiving side of a recorder's event channel
pub type RecorderEvents = mpsc::UnboundedReceiver<RecorderEvent>;

/// Encoding options handed to the recorder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderOptions {
    pub mime_type: Option<String>,
    pub video_bits_per_second: Option<u32>,
    pub audio_bits_per_second: Option<u32>,
}

impl RecorderOptions {
    /// Build recorder options from recording options
    pub fn from_options(options: &RecordingOptions) -> Self {
        Self {
            mime_type: options.mime_type().map(str::to_string),
            video_bits_per_second: options.video_bits_per_second,
            audio_bits_per_second: options.audio_bits_per_second,
        }
    }
}

/// Controls for one recorder instance
pub trait RecorderControl: Send {
    /// Begin recording; with a timeslice, fragments are flushed at that cadence
    fn start(&mut self, timeslice: Option<Duration>) -> Result<(), RecorderError>;

    fn pause(&mut self) -> Result<(), RecorderError>;

    fn resume(&mut self) -> Result<(), RecorderError>;

    /// Request finalization. The final fragment and `Stopped` arrive as events.
    fn stop(&mut self) -> Result<(), RecorderError>;

    fn state(&self) -> RecorderState;
}

/// A freshly created recorder bound to a stream
pub struct RecorderParts {
    pub control: Box<dyn RecorderControl>,
    pub events: RecorderEvents,
    /// MIME type the recorder will actually produce
    pub mime_type: String,
}

impl fmt::Debug for RecorderParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderParts")
            .field("state", &self.control.state())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Port for constructing recorders over a capture stream
pub trait RecorderFactory<S: CaptureStream>: Send + Sync + 'static {
    /// Whether the host can produce the given MIME type
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Create a recorder bound to `stream`.
    ///
    /// # Returns
    /// The recorder controls, its event channel and the negotiated MIME type
    fn create(&self, stream: &S, options: &RecorderOptions) -> Result<RecorderParts, RecorderError>;
}
