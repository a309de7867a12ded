//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::{ButtonLabels, Duration, RecordingOptions};

/// Where and for how long recordings are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory downloads are saved into
    pub dir: Option<String>,
    /// Stop automatically once the recording reaches this length (e.g. "10m")
    pub max_duration: Option<String>,
}

/// FFmpeg host backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfmpegConfig {
    /// Path to the ffmpeg binary
    pub path: Option<String>,
    /// Platform display/screen identifier (e.g. ":0.0", "1", "desktop")
    pub display: Option<String>,
    /// Platform audio input identifier (e.g. "default")
    pub audio_input: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub recording: Option<RecordingOptions>,
    pub output: Option<OutputConfig>,
    pub ffmpeg: Option<FfmpegConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            recording: Some(RecordingOptions::defaults()),
            output: Some(OutputConfig {
                dir: None,
                max_duration: None,
            }),
            ffmpeg: Some(FfmpegConfig {
                path: Some("ffmpeg".to_string()),
                display: None,
                audio_input: None,
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            recording: match (self.recording, other.recording) {
                (Some(b), Some(o)) => Some(b.merge(o)),
                (b, o) => o.or(b),
            },
            output: Self::merge_output_config(self.output, other.output),
            ffmpeg: Self::merge_ffmpeg_config(self.ffmpeg, other.ffmpeg),
        }
    }

    /// Merge output config sections
    fn merge_output_config(
        base: Option<OutputConfig>,
        other: Option<OutputConfig>,
    ) -> Option<OutputConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(OutputConfig {
                dir: o.dir.or(b.dir),
                max_duration: o.max_duration.or(b.max_duration),
            }),
        }
    }

    /// Merge ffmpeg config sections
    fn merge_ffmpeg_config(
        base: Option<FfmpegConfig>,
        other: Option<FfmpegConfig>,
    ) -> Option<FfmpegConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(FfmpegConfig {
                path: o.path.or(b.path),
                display: o.display.or(b.display),
                audio_input: o.audio_input.or(b.audio_input),
            }),
        }
    }

    /// Get recording options, or the defaults if not set
    pub fn recording_or_default(&self) -> RecordingOptions {
        RecordingOptions::defaults().merge(self.recording.clone().unwrap_or_default())
    }

    /// Get button labels from the recording section
    pub fn labels(&self) -> ButtonLabels {
        self.recording_or_default().labels()
    }

    /// Mutable access to the recording section, creating it if missing
    pub fn recording_mut(&mut self) -> &mut RecordingOptions {
        self.recording.get_or_insert_with(RecordingOptions::default)
    }

    /// Mutable access to the labels section, creating it if missing
    pub fn labels_mut(&mut self) -> &mut ButtonLabels {
        self.recording_mut()
            .button_labels
            .get_or_insert_with(ButtonLabels::default)
    }

    /// Mutable access to the output section, creating it if missing
    pub fn output_mut(&mut self) -> &mut OutputConfig {
        self.output.get_or_insert_with(OutputConfig::default)
    }

    /// Mutable access to the ffmpeg section, creating it if missing
    pub fn ffmpeg_mut(&mut self) -> &mut FfmpegConfig {
        self.ffmpeg.get_or_insert_with(FfmpegConfig::default)
    }

    /// Get the configured output directory, if any
    pub fn output_dir(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.dir.as_deref())
    }

    /// Get max duration as parsed Duration; None if not set or invalid
    pub fn max_duration(&self) -> Option<Duration> {
        self.output
            .as_ref()
            .and_then(|o| o.max_duration.as_ref())
            .and_then(|s| s.parse().ok())
    }

    /// Get ffmpeg binary path, or "ffmpeg" if not set
    pub fn ffmpeg_path_or_default(&self) -> &str {
        self.ffmpeg
            .as_ref()
            .and_then(|f| f.path.as_deref())
            .unwrap_or("ffmpeg")
    }

    /// Get the configured display identifier, if any
    pub fn display(&self) -> Option<&str> {
        self.ffmpeg.as_ref().and_then(|f| f.display.as_deref())
    }

    /// Get the configured audio input identifier, if any
    pub fn audio_input(&self) -> Option<&str> {
        self.ffmpeg.as_ref().and_then(|f| f.audio_input.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        let recording = config.recording.as_ref().unwrap();
        assert_eq!(recording.frame_rate, Some(30));
        assert_eq!(recording.audio, Some(true));
        assert_eq!(config.ffmpeg_path_or_default(), "ffmpeg");
        assert!(config.output_dir().is_none());
        assert!(config.max_duration().is_none());
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.recording.is_none());
        assert!(config.output.is_none());
        assert!(config.ffmpeg.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            recording: Some(RecordingOptions {
                mime_type: Some("video/webm".to_string()),
                frame_rate: Some(30),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                dir: Some("/base".to_string()),
                max_duration: Some("5m".to_string()),
            }),
            ..Default::default()
        };
        let other = AppConfig {
            recording: Some(RecordingOptions {
                mime_type: Some("video/mp4".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                dir: Some("/other".to_string()),
                max_duration: None,
            }),
            ..Default::default()
        };

        let merged = base.merge(other);
        let recording = merged.recording_or_default();
        assert_eq!(recording.mime_type, Some("video/mp4".to_string()));
        assert_eq!(recording.frame_rate, Some(30));
        assert_eq!(merged.output_dir(), Some("/other"));
        assert_eq!(merged.max_duration(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn merge_preserves_base_when_other_is_empty() {
        let base = AppConfig {
            ffmpeg: Some(FfmpegConfig {
                path: Some("/usr/local/bin/ffmpeg".to_string()),
                display: Some(":1".to_string()),
                audio_input: None,
            }),
            ..Default::default()
        };
        let merged = base.merge(AppConfig::empty());
        assert_eq!(merged.ffmpeg_path_or_default(), "/usr/local/bin/ffmpeg");
        assert_eq!(merged.display(), Some(":1"));
    }

    #[test]
    fn recording_or_default_fills_gaps() {
        let config = AppConfig {
            recording: Some(RecordingOptions {
                width: Some(1280),
                ..Default::default()
            }),
            ..Default::default()
        };
        let recording = config.recording_or_default();
        assert_eq!(recording.width, Some(1280));
        assert_eq!(recording.frame_rate, Some(30));
        assert!(recording.audio_or_default());
    }

    #[test]
    fn invalid_max_duration_is_ignored() {
        let config = AppConfig {
            output: Some(OutputConfig {
                dir: None,
                max_duration: Some("forever".to_string()),
            }),
            ..Default::default()
        };
        assert!(config.max_duration().is_none());
    }

    #[test]
    fn section_accessors_create_missing_sections() {
        let mut config = AppConfig::empty();
        config.labels_mut().start = Some("Go".to_string());
        config.ffmpeg_mut().display = Some(":2".to_string());
        config.output_mut().dir = Some("/tmp".to_string());

        assert_eq!(config.labels().start(), "Go");
        assert_eq!(config.display(), Some(":2"));
        assert_eq!(config.output_dir(), Some("/tmp"));
    }
}
