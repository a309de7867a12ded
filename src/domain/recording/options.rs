//! Recording options value object

use serde::{Deserialize, Serialize};

use super::format::RecordingFormat;

/// Base filename used when no custom download name is configured
pub const DEFAULT_DOWNLOAD_NAME: &str = "screen-recording";

/// Frame rate requested when none is configured
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Labels shown on the recording controls.
/// All fields are optional; unset labels fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonLabels {
    pub start: Option<String>,
    pub stop: Option<String>,
    pub pause: Option<String>,
    pub resume: Option<String>,
    pub download: Option<String>,
}

impl ButtonLabels {
    /// Labels with every field set to its default
    pub fn defaults() -> Self {
        Self {
            start: Some("Start Recording".to_string()),
            stop: Some("Stop Recording".to_string()),
            pause: Some("Pause".to_string()),
            resume: Some("Resume".to_string()),
            download: Some("Download".to_string()),
        }
    }

    /// Merge with another set, where other takes precedence
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: other.start.or(self.start),
            stop: other.stop.or(self.stop),
            pause: other.pause.or(self.pause),
            resume: other.resume.or(self.resume),
            download: other.download.or(self.download),
        }
    }

    pub fn start(&self) -> &str {
        self.start.as_deref().unwrap_or("Start Recording")
    }

    pub fn stop(&self) -> &str {
        self.stop.as_deref().unwrap_or("Stop Recording")
    }

    pub fn pause(&self) -> &str {
        self.pause.as_deref().unwrap_or("Pause")
    }

    pub fn resume(&self) -> &str {
        self.resume.as_deref().unwrap_or("Resume")
    }

    pub fn download(&self) -> &str {
        self.download.as_deref().unwrap_or("Download")
    }
}

/// Options for a recording session.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingOptions {
    /// Requested container/codec string; the host picks one when unset
    pub mime_type: Option<String>,
    pub video_bits_per_second: Option<u32>,
    pub audio_bits_per_second: Option<u32>,
    pub frame_rate: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Whether to request an audio track
    pub audio: Option<bool>,
    pub custom_download_name: Option<String>,
    pub custom_download_extension: Option<String>,
    /// How often the recorder should flush a fragment, in milliseconds
    pub timeslice_ms: Option<u64>,
    pub button_labels: Option<ButtonLabels>,
}

impl RecordingOptions {
    /// Create options with default values
    pub fn defaults() -> Self {
        Self {
            frame_rate: Some(DEFAULT_FRAME_RATE),
            audio: Some(true),
            button_labels: Some(ButtonLabels::defaults()),
            ..Self::default()
        }
    }

    /// Merge these options with another set, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            mime_type: other.mime_type.or(self.mime_type),
            video_bits_per_second: other.video_bits_per_second.or(self.video_bits_per_second),
            audio_bits_per_second: other.audio_bits_per_second.or(self.audio_bits_per_second),
            frame_rate: other.frame_rate.or(self.frame_rate),
            width: other.width.or(self.width),
            height: other.height.or(self.height),
            audio: other.audio.or(self.audio),
            custom_download_name: other.custom_download_name.or(self.custom_download_name),
            custom_download_extension: other
                .custom_download_extension
                .or(self.custom_download_extension),
            timeslice_ms: other.timeslice_ms.or(self.timeslice_ms),
            button_labels: match (self.button_labels, other.button_labels) {
                (Some(b), Some(o)) => Some(b.merge(o)),
                (b, o) => o.or(b),
            },
        }
    }

    /// Get the requested MIME type, ignoring blank strings
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Get audio setting, or true if not set
    pub fn audio_or_default(&self) -> bool {
        self.audio.unwrap_or(true)
    }

    /// Get frame rate, or the default if not set
    pub fn frame_rate_or_default(&self) -> u32 {
        self.frame_rate.unwrap_or(DEFAULT_FRAME_RATE)
    }

    /// Get button labels, falling back to the defaults per label
    pub fn labels(&self) -> ButtonLabels {
        ButtonLabels::defaults().merge(self.button_labels.clone().unwrap_or_default())
    }

    /// Derive the download filename for a recording in `format`.
    ///
    /// The extension comes from `custom_download_extension` (leading dots
    /// stripped) or from the negotiated format.
    pub fn download_filename(&self, format: RecordingFormat) -> String {
        let name = self
            .custom_download_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_DOWNLOAD_NAME);

        let extension = self
            .custom_download_extension
            .as_deref()
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .unwrap_or(format.extension());

        format!("{}.{}", name, extension)
    }
}
