//! FFmpeg-based screen capture source
//!
//! FFmpeg captures and encodes in one process, so acquiring a stream here
//! validates the host and resolves the platform input. The process itself is
//! spawned by the recorder bound to the stream. Stopping the tracks signals
//! that recorder to kill its process.

use std::env;
use std::fmt;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::{
    CaptureConstraints, CaptureError, CaptureSource, CaptureStream, TrackInfo, TrackKind,
    TrackState, VideoConstraints,
};
use crate::domain::recording::DEFAULT_FRAME_RATE;

/// FFmpeg input device family for the current platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBackend {
    /// Linux and other Unix: x11grab + PulseAudio
    X11,
    /// macOS: avfoundation
    AvFoundation,
    /// Windows: gdigrab + DirectShow
    GdiGrab,
}

impl CaptureBackend {
    /// Backend for the platform this binary was built for
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::AvFoundation
        } else if cfg!(windows) {
            Self::GdiGrab
        } else {
            Self::X11
        }
    }

    /// Resolve the display to capture.
    ///
    /// X11 needs a display from config or `$DISPLAY`; the other backends
    /// fall back to the main screen.
    fn resolve_display(
        &self,
        configured: Option<&str>,
        env_display: Option<String>,
    ) -> Result<String, CaptureError> {
        if let Some(display) = configured.map(str::trim).filter(|d| !d.is_empty()) {
            return Ok(display.to_string());
        }
        match self {
            Self::X11 => env_display
                .filter(|d| !d.trim().is_empty())
                .ok_or(CaptureError::NoDisplay),
            Self::AvFoundation => Ok("1".to_string()),
            Self::GdiGrab => Ok("desktop".to_string()),
        }
    }

    /// Resolve the audio input. DirectShow has no usable default device name.
    fn resolve_audio_input(&self, configured: Option<&str>) -> Option<String> {
        if let Some(input) = configured.map(str::trim).filter(|i| !i.is_empty()) {
            return Some(input.to_string());
        }
        match self {
            Self::X11 => Some("default".to_string()),
            Self::AvFoundation => Some("0".to_string()),
            Self::GdiGrab => None,
        }
    }

    /// Build the ffmpeg input arguments
    fn input_args(&self, display: &str, audio_input: Option<&str>, frame_rate: u32) -> Vec<String> {
        let frame_rate = frame_rate.to_string();
        let mut args: Vec<String> = Vec::new();

        match self {
            Self::X11 => {
                args.extend(
                    ["-f", "x11grab", "-framerate", frame_rate.as_str(), "-draw_mouse", "1", "-i", display]
                        .map(String::from),
                );
                if let Some(input) = audio_input {
                    args.extend(["-f", "pulse", "-i", input].map(String::from));
                }
            }
            Self::AvFoundation => {
                let device = format!("{}:{}", display, audio_input.unwrap_or("none"));
                args.extend(
                    ["-f", "avfoundation", "-framerate", frame_rate.as_str(), "-capture_cursor", "1", "-i", device.as_str()]
                        .map(String::from),
                );
            }
            Self::GdiGrab => {
                args.extend(
                    ["-f", "gdigrab", "-framerate", frame_rate.as_str(), "-draw_mouse", "1", "-i", display]
                        .map(String::from),
                );
                if let Some(input) = audio_input {
                    let device = format!("audio={}", input);
                    args.extend(["-f", "dshow", "-i", device.as_str()].map(String::from));
                }
            }
        }

        args
    }
}

/// Capture source that records the screen through FFmpeg
pub struct FfmpegCaptureSource {
    ffmpeg_path: String,
    display: Option<String>,
    audio_input: Option<String>,
    backend: CaptureBackend,
}

impl FfmpegCaptureSource {
    /// Create a capture source using `ffmpeg` from `PATH`
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            display: None,
            audio_input: None,
            backend: CaptureBackend::current(),
        }
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn with_display(mut self, display: Option<String>) -> Self {
        self.display = display;
        self
    }

    pub fn with_audio_input(mut self, audio_input: Option<String>) -> Self {
        self.audio_input = audio_input;
        self
    }

    /// Check that the ffmpeg binary can be run
    async fn probe(&self) -> Result<(), CaptureError> {
        let status = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::BackendNotFound(self.ffmpeg_path.clone())
                } else {
                    CaptureError::AcquireFailed(e.to_string())
                }
            })?;

        if !status.success() {
            return Err(CaptureError::AcquireFailed(format!(
                "{} -version exited with {}",
                self.ffmpeg_path, status
            )));
        }
        Ok(())
    }
}

impl Default for FfmpegCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureSource for FfmpegCaptureSource {
    type Stream = FfmpegStream;

    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<FfmpegStream, CaptureError> {
        let screen = self
            .backend
            .resolve_display(self.display.as_deref(), env::var("DISPLAY").ok())?;
        self.probe().await?;

        let audio_input = if constraints.audio {
            let input = self.backend.resolve_audio_input(self.audio_input.as_deref());
            if input.is_none() {
                warn!("no audio input configured, recording video only");
            }
            input
        } else {
            None
        };

        let frame_rate = constraints.video.frame_rate.unwrap_or(DEFAULT_FRAME_RATE);
        let input_args = self
            .backend
            .input_args(&screen, audio_input.as_deref(), frame_rate);

        let stream = FfmpegStream::new(
            self.ffmpeg_path.clone(),
            input_args,
            constraints.video,
            &screen,
            audio_input.as_deref(),
        );
        debug!(stream = stream.id(), display = %screen, audio = ?audio_input, "ffmpeg capture resolved");
        Ok(stream)
    }
}

struct StreamInner {
    id: String,
    ffmpeg_path: String,
    input_args: Vec<String>,
    video: VideoConstraints,
    tracks: Mutex<Vec<TrackInfo>>,
    ended: watch::Sender<bool>,
}

/// Capture stream descriptor shared with the recorder bound to it
#[derive(Clone)]
pub struct FfmpegStream {
    inner: Arc<StreamInner>,
}

impl fmt::Debug for FfmpegStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfmpegStream")
            .field("id", &self.inner.id)
            .field("ffmpeg_path", &self.inner.ffmpeg_path)
            .field("input_args", &self.inner.input_args)
            .field("ended", &*self.inner.ended.borrow())
            .finish()
    }
}

impl FfmpegStream {
    pub(crate) fn new(
        ffmpeg_path: String,
        input_args: Vec<String>,
        video: VideoConstraints,
        display: &str,
        audio_input: Option<&str>,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        let mut tracks = vec![TrackInfo {
            id: format!("{}-video", id),
            kind: TrackKind::Video,
            label: format!("screen {}", display),
            state: TrackState::Live,
        }];
        if let Some(input) = audio_input {
            tracks.push(TrackInfo {
                id: format!("{}-audio", id),
                kind: TrackKind::Audio,
                label: format!("audio {}", input),
                state: TrackState::Live,
            });
        }

        let (ended, _) = watch::channel(false);
        Self {
            inner: Arc::new(StreamInner {
                id,
                ffmpeg_path,
                input_args,
                video,
                tracks: Mutex::new(tracks),
                ended,
            }),
        }
    }

    /// Binary used to run the capture
    pub fn ffmpeg_path(&self) -> &str {
        &self.inner.ffmpeg_path
    }

    /// FFmpeg input arguments (`-f ... -i ...`)
    pub fn input_args(&self) -> &[String] {
        &self.inner.input_args
    }

    /// Requested video shape
    pub fn video(&self) -> VideoConstraints {
        self.inner.video
    }

    pub fn has_audio(&self) -> bool {
        self.tracks().iter().any(|t| t.kind == TrackKind::Audio)
    }

    /// Flips to `true` once the tracks are stopped
    pub fn ended(&self) -> watch::Receiver<bool> {
        self.inner.ended.subscribe()
    }
}

impl CaptureStream for FfmpegStream {
    fn id(&self) -> &str {
        &self.inner.id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.inner
            .tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn stop_all_tracks(&self) {
        let mut tracks = self
            .inner
            .tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for track in tracks.iter_mut() {
            track.state = TrackState::Ended;
        }
        drop(tracks);

        if !self.inner.ended.send_replace(true) {
            debug!(stream = %self.inner.id, "capture tracks stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(audio: Option<&str>) -> FfmpegStream {
        FfmpegStream::new(
            "ffmpeg".to_string(),
            vec!["-f".to_string(), "x11grab".to_string()],
            VideoConstraints::default(),
            ":0",
            audio,
        )
    }

    #[test]
    fn x11_requires_a_display() {
        let backend = CaptureBackend::X11;
        assert_eq!(backend.resolve_display(None, None), Err(CaptureError::NoDisplay));
        assert_eq!(
            backend.resolve_display(None, Some(":1".to_string())).unwrap(),
            ":1"
        );
        assert_eq!(
            backend.resolve_display(Some(":0.0+100,200"), Some(":1".to_string())).unwrap(),
            ":0.0+100,200"
        );
    }

    #[test]
    fn other_backends_default_to_main_screen() {
        assert_eq!(CaptureBackend::AvFoundation.resolve_display(None, None).unwrap(), "1");
        assert_eq!(CaptureBackend::GdiGrab.resolve_display(None, None).unwrap(), "desktop");
    }

    #[test]
    fn x11_input_args_with_audio() {
        let args = CaptureBackend::X11.input_args(":0", Some("default"), 30);
        assert_eq!(
            args,
            vec![
                "-f", "x11grab", "-framerate", "30", "-draw_mouse", "1", "-i", ":0", "-f", "pulse",
                "-i", "default",
            ]
        );
    }

    #[test]
    fn avfoundation_combines_devices() {
        let args = CaptureBackend::AvFoundation.input_args("1", None, 60);
        assert_eq!(args.last().map(String::as_str), Some("1:none"));
        assert!(args.contains(&"60".to_string()));
    }

    #[test]
    fn gdigrab_skips_audio_without_device() {
        assert_eq!(CaptureBackend::GdiGrab.resolve_audio_input(None), None);
        let args = CaptureBackend::GdiGrab.input_args("desktop", Some("Microphone"), 30);
        assert!(args.contains(&"audio=Microphone".to_string()));
    }

    #[test]
    fn stream_has_video_and_optional_audio_track() {
        let video_only = stream(None);
        assert_eq!(video_only.tracks().len(), 1);
        assert!(!video_only.has_audio());

        let with_audio = stream(Some("default"));
        assert_eq!(with_audio.tracks().len(), 2);
        assert!(with_audio.has_audio());
        assert!(with_audio.is_active());
    }

    #[test]
    fn stop_all_tracks_ends_every_track() {
        let stream = stream(Some("default"));
        let ended = stream.ended();

        stream.stop_all_tracks();
        stream.stop_all_tracks();

        assert!(stream.tracks().iter().all(|t| t.state == TrackState::Ended));
        assert!(!stream.is_active());
        assert!(*ended.borrow());
    }

    #[test]
    fn debug_output_names_the_stream() {
        let stream = stream(None);
        let rendered = format!("{:?}", stream);
        assert!(rendered.contains(stream.id()));
        assert!(rendered.contains("ended: false"));
    }

    #[tokio::test]
    async fn missing_binary_is_backend_not_found() {
        let source = FfmpegCaptureSource::new()
            .with_ffmpeg_path("/nonexistent/ffmpeg-binary")
            .with_display(Some(":0".to_string()));

        let err = source.acquire(&CaptureConstraints::default()).await.unwrap_err();
        assert_eq!(
            err,
            CaptureError::BackendNotFound("/nonexistent/ffmpeg-binary".to_string())
        );
    }
}
