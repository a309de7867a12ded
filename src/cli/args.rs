//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::config::{AppConfig, FfmpegConfig, OutputConfig};
use crate::domain::recording::{Duration, RecordingOptions};

/// ScreenRecorder - capture the screen to WebM or MP4
#[derive(Parser, Debug)]
#[command(name = "screen-recorder")]
#[command(version)]
#[command(about = "Record the screen with pause/resume and save it as WebM or MP4")]
#[command(
    after_help = "Controls while recording: p + Enter pauses/resumes, s + Enter stops.\nCtrl+C stops and saves; SIGUSR1 toggles pause."
)]
pub struct Cli {
    /// Container/codec string (e.g. "video/webm;codecs=vp9,opus", "video/mp4")
    #[arg(short = 'm', long, value_name = "MIME")]
    pub mime_type: Option<String>,

    /// Video bitrate in bits per second
    #[arg(long, value_name = "BPS")]
    pub video_bitrate: Option<u32>,

    /// Audio bitrate in bits per second
    #[arg(long, value_name = "BPS")]
    pub audio_bitrate: Option<u32>,

    /// Capture frame rate
    #[arg(short = 'r', long, value_name = "FPS")]
    pub frame_rate: Option<u32>,

    /// Output width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Record video only
    #[arg(long)]
    pub no_audio: bool,

    /// Download file name, without extension
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,

    /// Download file extension (defaults to the recorded format)
    #[arg(short = 'e', long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Directory recordings are saved into
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Stop automatically after this long (e.g. 30s, 10m, 1h)
    #[arg(short = 't', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Display or screen to capture (e.g. ":0.0", "1", "desktop")
    #[arg(long, value_name = "DISPLAY")]
    pub display: Option<String>,

    /// Flush recorded data every N milliseconds
    #[arg(long, value_name = "MS")]
    pub timeslice: Option<u64>,

    /// Print session snapshots as JSON lines on stdout
    #[arg(long)]
    pub json: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config layer made of the flags given on the command line
    pub fn to_config(&self) -> AppConfig {
        let recording = RecordingOptions {
            mime_type: self.mime_type.clone(),
            video_bits_per_second: self.video_bitrate,
            audio_bits_per_second: self.audio_bitrate,
            frame_rate: self.frame_rate,
            width: self.width,
            height: self.height,
            audio: if self.no_audio { Some(false) } else { None },
            custom_download_name: self.name.clone(),
            custom_download_extension: self.extension.clone(),
            timeslice_ms: self.timeslice,
            button_labels: None,
        };

        AppConfig {
            recording: Some(recording),
            output: Some(OutputConfig {
                dir: self.output_dir.clone(),
                max_duration: self.max_duration.clone(),
            }),
            ffmpeg: self.display.clone().map(|display| FfmpegConfig {
                display: Some(display),
                ..Default::default()
            }),
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed record options (merged config)
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub recording: RecordingOptions,
    pub max_duration: Option<Duration>,
    pub output_dir: Option<String>,
    pub ffmpeg_path: String,
    pub display: Option<String>,
    pub audio_input: Option<String>,
    pub json: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "recording.mime_type",
    "recording.video_bits_per_second",
    "recording.audio_bits_per_second",
    "recording.frame_rate",
    "recording.width",
    "recording.height",
    "recording.audio",
    "recording.download_name",
    "recording.download_extension",
    "recording.timeslice_ms",
    "labels.start",
    "labels.stop",
    "labels.pause",
    "labels.resume",
    "labels.download",
    "output.dir",
    "output.max_duration",
    "ffmpeg.path",
    "ffmpeg.display",
    "ffmpeg.audio_input",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
