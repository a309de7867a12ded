//! FFmpeg-based media recorder adapter

use std::collections::VecDeque;
use std::mem;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, trace, warn};

use crate::application::ports::{
    CaptureStream, RecorderControl, RecorderError, RecorderEvent, RecorderFactory,
    RecorderOptions, RecorderParts, RecorderState, VideoConstraints,
};
use crate::domain::recording::{MimeType, RecordingFormat};
use crate::infrastructure::capture::FfmpegStream;

/// Video bitrate when none is requested
pub const DEFAULT_VIDEO_BITRATE: u32 = 2_500_000;
/// Audio bitrate when none is requested
pub const DEFAULT_AUDIO_BITRATE: u32 = 128_000;

const READ_BUFFER_SIZE: usize = 64 * 1024;
const STDERR_TAIL_LINES: usize = 8;

/// Map a video codec id to an ffmpeg encoder for the given container
fn video_encoder(format: RecordingFormat, codec: &str) -> Option<&'static str> {
    match format {
        RecordingFormat::Webm => match codec {
            "vp8" | "vp8.0" => Some("libvpx"),
            "vp9" | "vp9.0" => Some("libvpx-vp9"),
            c if c == "av1" || c.starts_with("av01") => Some("libaom-av1"),
            _ => None,
        },
        RecordingFormat::Mp4 => match codec {
            c if c == "h264" || c.starts_with("avc1") => Some("libx264"),
            c if c == "hevc" || c.starts_with("hvc1") || c.starts_with("hev1") => Some("libx265"),
            _ => None,
        },
    }
}

/// Map an audio codec id to an ffmpeg encoder for the given container
fn audio_encoder(format: RecordingFormat, codec: &str) -> Option<&'static str> {
    match format {
        RecordingFormat::Webm => match codec {
            "opus" => Some("libopus"),
            "vorbis" => Some("libvorbis"),
            _ => None,
        },
        RecordingFormat::Mp4 => match codec {
            c if c == "aac" || c.starts_with("mp4a") => Some("aac"),
            _ => None,
        },
    }
}

/// Codec pair used when the MIME type names none
fn default_codecs(format: RecordingFormat) -> (&'static str, &'static str) {
    match format {
        RecordingFormat::Webm => ("vp9", "opus"),
        RecordingFormat::Mp4 => ("avc1", "aac"),
    }
}

/// Negotiated output encoding for one recording
#[derive(Debug, Clone, PartialEq, Eq)]
struct Encoding {
    mime: MimeType,
    video_encoder: &'static str,
    audio_encoder: Option<&'static str>,
}

impl Encoding {
    /// Resolve a requested MIME type against what ffmpeg can produce.
    ///
    /// No request means WebM with VP9 (and Opus when there is audio).
    fn negotiate(requested: Option<&str>, has_audio: bool) -> Result<Self, RecorderError> {
        let unsupported = || RecorderError::UnsupportedMimeType(requested.unwrap_or_default().to_string());

        let requested_mime = match requested {
            Some(s) => Some(s.parse::<MimeType>().map_err(|_| unsupported())?),
            None => None,
        };
        if requested_mime.as_ref().is_some_and(MimeType::is_audio_only) {
            return Err(unsupported());
        }

        let format = requested_mime
            .as_ref()
            .map(MimeType::format)
            .unwrap_or_default();
        let (default_video, default_audio) = default_codecs(format);

        let mut video: Option<(&str, &'static str)> = None;
        let mut audio: Option<(&str, &'static str)> = None;
        for codec in requested_mime.iter().flat_map(|m| m.codecs()).map(String::as_str) {
            if let Some(encoder) = video_encoder(format, codec) {
                if video.replace((codec, encoder)).is_some() {
                    return Err(unsupported());
                }
            } else if let Some(encoder) = audio_encoder(format, codec) {
                if audio.replace((codec, encoder)).is_some() {
                    return Err(unsupported());
                }
            } else {
                return Err(unsupported());
            }
        }

        let (video_codec, video_encoder) = match video {
            Some(v) => v,
            None => (default_video, video_encoder(format, default_video).ok_or_else(unsupported)?),
        };
        let audio = if has_audio {
            match audio {
                Some(a) => Some(a),
                None => Some((default_audio, audio_encoder(format, default_audio).ok_or_else(unsupported)?)),
            }
        } else {
            None
        };

        let mut codecs = vec![video_codec];
        if let Some((codec, _)) = audio {
            codecs.push(codec);
        }

        Ok(Self {
            mime: MimeType::new(format, &codecs),
            video_encoder,
            audio_encoder: audio.map(|(_, encoder)| encoder),
        })
    }
}

/// Build a `scale` filter from the requested size, keeping aspect when one side is unset
fn scale_filter(video: VideoConstraints) -> Option<String> {
    match (video.width, video.height) {
        (Some(w), Some(h)) => Some(format!("scale={}:{}", w, h)),
        (Some(w), None) => Some(format!("scale={}:-2", w)),
        (None, Some(h)) => Some(format!("scale=-2:{}", h)),
        (None, None) => None,
    }
}

/// Build the full ffmpeg argument list for a recording
fn build_args(stream: &FfmpegStream, encoding: &Encoding, options: &RecorderOptions) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostats", "-loglevel", "error"]
        .map(String::from)
        .to_vec();
    args.extend(stream.input_args().iter().cloned());

    if let Some(filter) = scale_filter(stream.video()) {
        args.extend(["-vf".to_string(), filter]);
    }

    let video_bitrate = options.video_bits_per_second.unwrap_or(DEFAULT_VIDEO_BITRATE);
    args.extend([
        "-c:v".to_string(),
        encoding.video_encoder.to_string(),
        "-b:v".to_string(),
        video_bitrate.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ]);
    match encoding.video_encoder {
        "libvpx" | "libvpx-vp9" => {
            args.extend(["-deadline", "realtime", "-cpu-used", "8"].map(String::from));
        }
        "libx264" | "libx265" => {
            args.extend(["-preset", "veryfast"].map(String::from));
        }
        _ => {}
    }

    match encoding.audio_encoder {
        Some(encoder) => {
            let audio_bitrate = options.audio_bits_per_second.unwrap_or(DEFAULT_AUDIO_BITRATE);
            args.extend([
                "-c:a".to_string(),
                encoder.to_string(),
                "-b:a".to_string(),
                audio_bitrate.to_string(),
            ]);
        }
        None => args.push("-an".to_string()),
    }

    // Output must be streamable since it is read from a pipe
    match encoding.mime.format() {
        RecordingFormat::Webm => args.extend(["-f", "webm"].map(String::from)),
        RecordingFormat::Mp4 => args.extend(
            ["-movflags", "frag_keyframe+empty_moov+default_base_moof", "-f", "mp4"].map(String::from),
        ),
    }
    args.push("pipe:1".to_string());

    args
}

/// Recorder factory spawning one ffmpeg process per recording
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegRecorderFactory;

impl FfmpegRecorderFactory {
    pub fn new() -> Self {
        Self
    }
}

impl RecorderFactory<FfmpegStream> for FfmpegRecorderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        Encoding::negotiate(Some(mime_type), true).is_ok()
    }

    fn create(
        &self,
        stream: &FfmpegStream,
        options: &RecorderOptions,
    ) -> Result<RecorderParts, RecorderError> {
        let encoding = Encoding::negotiate(options.mime_type.as_deref(), stream.has_audio())?;
        let args = build_args(stream, &encoding, options);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        debug!(mime_type = %encoding.mime, "ffmpeg recorder created");

        Ok(RecorderParts {
            control: Box::new(FfmpegMediaRecorder::new(stream.clone(), args, events_tx)),
            events: events_rx,
            mime_type: encoding.mime.to_string(),
        })
    }
}

/// Controls for one ffmpeg recording process.
///
/// Dropping the recorder kills a process that is still running.
pub struct FfmpegMediaRecorder {
    stream: FfmpegStream,
    args: Vec<String>,
    events: Option<mpsc::UnboundedSender<RecorderEvent>>,
    state: RecorderState,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    stop_requested: Arc<AtomicBool>,
    cancel: Option<oneshot::Sender<()>>,
}

impl FfmpegMediaRecorder {
    fn new(
        stream: FfmpegStream,
        args: Vec<String>,
        events: mpsc::UnboundedSender<RecorderEvent>,
    ) -> Self {
        Self {
            stream,
            args,
            events: Some(events),
            state: RecorderState::Inactive,
            pid: None,
            stdin: None,
            stop_requested: Arc::new(AtomicBool::new(false)),
            cancel: None,
        }
    }

    /// Spawn the ffmpeg process.
    ///
    /// On Unix it runs in its own process group: terminal signals such as
    /// Ctrl+C must not reach it. It is only stopped through stdin or a kill.
    fn spawn_ffmpeg(&self) -> Result<Child, RecorderError> {
        let program = self.stream.ffmpeg_path();
        let mut command = Command::new(program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        command
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecorderError::StartFailed(format!("{} not found", program))
                } else {
                    RecorderError::StartFailed(e.to_string())
                }
            })
    }

    fn invalid(&self, action: &'static str) -> RecorderError {
        RecorderError::InvalidState {
            action,
            state: self.state,
        }
    }

    /// Let a stopped process run again so it can finalize
    #[cfg(unix)]
    fn wake_if_paused(&self) -> Result<(), RecorderError> {
        if self.state == RecorderState::Paused {
            self.send_signal(Signal::SIGCONT)?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn wake_if_paused(&self) -> Result<(), RecorderError> {
        Ok(())
    }

    /// Send signal to the ffmpeg process
    #[cfg(unix)]
    fn send_signal(&self, sig: Signal) -> Result<(), RecorderError> {
        if let Some(id) = self.pid {
            let pid = i32::try_from(id)
                .map_err(|_| RecorderError::Fault(format!("invalid pid {}", id)))?;
            signal::kill(Pid::from_raw(pid), sig)
                .map_err(|e| RecorderError::Fault(format!("Signal failed: {}", e)))?;
        }
        Ok(())
    }
}

impl RecorderControl for FfmpegMediaRecorder {
    fn start(&mut self, timeslice: Option<Duration>) -> Result<(), RecorderError> {
        let Some(events) = self.events.take() else {
            return Err(self.invalid("start"));
        };

        let mut child = self.spawn_ffmpeg()?;
        self.pid = child.id();
        self.stdin = child.stdin.take();

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.cancel = Some(cancel_tx);
        tokio::spawn(supervise(
            child,
            events,
            timeslice,
            Arc::clone(&self.stop_requested),
            self.stream.clone(),
            cancel_rx,
        ));

        debug!(pid = ?self.pid, ?timeslice, "ffmpeg recording started");
        self.state = RecorderState::Recording;
        Ok(())
    }

    #[cfg(unix)]
    fn pause(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Recording {
            return Err(self.invalid("pause"));
        }
        self.send_signal(Signal::SIGSTOP)?;
        self.state = RecorderState::Paused;
        Ok(())
    }

    #[cfg(not(unix))]
    fn pause(&mut self) -> Result<(), RecorderError> {
        Err(RecorderError::Fault(
            "pausing ffmpeg is not supported on this platform".to_string(),
        ))
    }

    #[cfg(unix)]
    fn resume(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Paused {
            return Err(self.invalid("resume"));
        }
        self.send_signal(Signal::SIGCONT)?;
        self.state = RecorderState::Recording;
        Ok(())
    }

    #[cfg(not(unix))]
    fn resume(&mut self) -> Result<(), RecorderError> {
        Err(self.invalid("resume"))
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        if self.state == RecorderState::Inactive {
            return Err(self.invalid("stop"));
        }

        self.wake_if_paused()?;
        self.stop_requested.store(true, Ordering::SeqCst);
        self.state = RecorderState::Inactive;

        // `q` on stdin makes ffmpeg finalize the container and exit
        match self.stdin.take() {
            Some(mut stdin) => {
                tokio::spawn(async move {
                    if let Err(e) = stdin.write_all(b"q").await {
                        debug!(error = %e, "could not send quit to ffmpeg");
                    }
                });
            }
            None => {
                if let Some(cancel) = self.cancel.take() {
                    let _ = cancel.send(());
                }
            }
        }
        Ok(())
    }

    fn state(&self) -> RecorderState {
        self.state
    }
}

async fn next_flush(flush: &mut Option<Interval>) {
    match flush {
        Some(flush) => {
            flush.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Keep the last few stderr lines for error reports
async fn collect_stderr_tail(stderr: ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        trace!(line = %line, "ffmpeg");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("; ")
}

/// Pump ffmpeg output into recorder events until the process exits
async fn supervise(
    mut child: Child,
    events: mpsc::UnboundedSender<RecorderEvent>,
    timeslice: Option<Duration>,
    stop_requested: Arc<AtomicBool>,
    stream: FfmpegStream,
    mut cancel: oneshot::Receiver<()>,
) {
    let Some(mut stdout) = child.stdout.take() else {
        let _ = events.send(RecorderEvent::Errored(RecorderError::Fault(
            "ffmpeg stdout was not captured".to_string(),
        )));
        return;
    };
    let stderr_tail = child.stderr.take().map(|stderr| tokio::spawn(collect_stderr_tail(stderr)));

    let mut ended = stream.ended();
    let mut flush = timeslice.map(|period| interval_at(Instant::now() + period, period));
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut killed = false;
    let mut read_error = None;

    loop {
        tokio::select! {
            read = stdout.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(e) => {
                    read_error = Some(e.to_string());
                    break;
                }
            },
            () = next_flush(&mut flush) => {
                if !pending.is_empty() {
                    let _ = events.send(RecorderEvent::DataAvailable(mem::take(&mut pending)));
                }
            }
            _ = ended.wait_for(|ended| *ended), if !killed => {
                debug!("capture tracks stopped, killing ffmpeg");
                killed = true;
                let _ = child.start_kill();
            }
            _ = &mut cancel, if !killed => {
                killed = true;
                let _ = child.start_kill();
            }
        }
    }

    if !pending.is_empty() {
        let _ = events.send(RecorderEvent::DataAvailable(pending));
    }

    let status = child.wait().await;
    let tail = match stderr_tail {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };
    stream.stop_all_tracks();

    let event = match (read_error, status) {
        (Some(e), _) => RecorderEvent::Errored(RecorderError::Fault(format!(
            "reading ffmpeg output failed: {}",
            e
        ))),
        (None, _) if stop_requested.load(Ordering::SeqCst) => RecorderEvent::Stopped,
        (None, Ok(status)) if status.success() && !killed => RecorderEvent::Stopped,
        (None, Ok(status)) => {
            let detail = if tail.is_empty() { status.to_string() } else { tail };
            warn!(%detail, "ffmpeg exited unexpectedly");
            RecorderEvent::Errored(RecorderError::Fault(format!("ffmpeg exited: {}", detail)))
        }
        (None, Err(e)) => RecorderEvent::Errored(RecorderError::Fault(e.to_string())),
    };
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(video: VideoConstraints, audio: Option<&str>) -> FfmpegStream {
        FfmpegStream::new(
            "ffmpeg".to_string(),
            vec!["-f".to_string(), "x11grab".to_string(), "-i".to_string(), ":0".to_string()],
            video,
            ":0",
            audio,
        )
    }

    #[test]
    fn default_encoding_is_webm_vp9_opus() {
        let encoding = Encoding::negotiate(None, true).unwrap();
        assert_eq!(encoding.mime.to_string(), "video/webm;codecs=vp9,opus");
        assert_eq!(encoding.video_encoder, "libvpx-vp9");
        assert_eq!(encoding.audio_encoder, Some("libopus"));
    }

    #[test]
    fn default_encoding_without_audio_has_no_audio_codec() {
        let encoding = Encoding::negotiate(None, false).unwrap();
        assert_eq!(encoding.mime.to_string(), "video/webm;codecs=vp9");
        assert_eq!(encoding.audio_encoder, None);
    }

    #[test]
    fn mp4_without_codecs_uses_h264_aac() {
        let encoding = Encoding::negotiate(Some("video/mp4"), true).unwrap();
        assert_eq!(encoding.mime.format(), RecordingFormat::Mp4);
        assert_eq!(encoding.video_encoder, "libx264");
        assert_eq!(encoding.audio_encoder, Some("aac"));
    }

    #[test]
    fn explicit_codecs_are_honoured() {
        let encoding = Encoding::negotiate(Some("video/webm;codecs=\"vp8,vorbis\""), true).unwrap();
        assert_eq!(encoding.video_encoder, "libvpx");
        assert_eq!(encoding.audio_encoder, Some("libvorbis"));

        let encoding = Encoding::negotiate(Some("video/mp4;codecs=avc1.42E01E,mp4a.40.2"), true).unwrap();
        assert_eq!(encoding.video_encoder, "libx264");
        assert_eq!(encoding.audio_encoder, Some("aac"));
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let factory = FfmpegRecorderFactory::new();
        assert!(factory.is_type_supported("video/webm"));
        assert!(factory.is_type_supported("video/webm;codecs=av1"));
        assert!(factory.is_type_supported("video/mp4;codecs=hevc"));
        assert!(!factory.is_type_supported("video/ogg"));
        assert!(!factory.is_type_supported("video/webm;codecs=h264"));
        assert!(!factory.is_type_supported("video/mp4;codecs=vp9,opus"));
        assert!(!factory.is_type_supported("video/webm;codecs=vp8,vp9"));
        assert!(!factory.is_type_supported("audio/webm;codecs=opus"));
        assert!(!factory.is_type_supported("not a mime type"));
    }

    #[test]
    fn scale_filter_keeps_aspect() {
        let both = VideoConstraints { width: Some(1280), height: Some(720), frame_rate: None };
        let width = VideoConstraints { width: Some(1280), ..Default::default() };
        let height = VideoConstraints { height: Some(720), ..Default::default() };

        assert_eq!(scale_filter(both).as_deref(), Some("scale=1280:720"));
        assert_eq!(scale_filter(width).as_deref(), Some("scale=1280:-2"));
        assert_eq!(scale_filter(height).as_deref(), Some("scale=-2:720"));
        assert_eq!(scale_filter(VideoConstraints::default()), None);
    }

    #[test]
    fn webm_args_write_to_stdout() {
        let stream = stream(VideoConstraints::default(), Some("default"));
        let encoding = Encoding::negotiate(None, true).unwrap();
        let args = build_args(&stream, &encoding, &RecorderOptions::default());

        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
        assert!(args.windows(2).any(|w| w == ["-f", "webm"]));
        assert!(args.windows(2).any(|w| w == ["-b:v", "2500000"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "128000"]));
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[test]
    fn mp4_args_are_fragmented() {
        let video = VideoConstraints { width: Some(1920), ..Default::default() };
        let stream = stream(video, None);
        let encoding = Encoding::negotiate(Some("video/mp4"), false).unwrap();
        let options = RecorderOptions {
            mime_type: Some("video/mp4".to_string()),
            video_bits_per_second: Some(5_000_000),
            audio_bits_per_second: None,
        };
        let args = build_args(&stream, &encoding, &options);

        assert!(args.windows(2).any(|w| w == ["-movflags", "frag_keyframe+empty_moov+default_base_moof"]));
        assert!(args.windows(2).any(|w| w == ["-vf", "scale=1920:-2"]));
        assert!(args.windows(2).any(|w| w == ["-b:v", "5000000"]));
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn create_reports_negotiated_mime_type() {
        let factory = FfmpegRecorderFactory::new();
        let parts = factory
            .create(&stream(VideoConstraints::default(), None), &RecorderOptions::default())
            .unwrap();

        assert_eq!(parts.mime_type, "video/webm;codecs=vp9");
        assert_eq!(parts.control.state(), RecorderState::Inactive);
    }

    #[test]
    fn create_rejects_unsupported_type() {
        let factory = FfmpegRecorderFactory::new();
        let options = RecorderOptions {
            mime_type: Some("video/quicktime".to_string()),
            ..Default::default()
        };
        let err = factory
            .create(&stream(VideoConstraints::default(), None), &options)
            .unwrap_err();
        assert_eq!(err, RecorderError::UnsupportedMimeType("video/quicktime".to_string()));
    }

    #[tokio::test]
    async fn stop_before_start_is_invalid() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut recorder = FfmpegMediaRecorder::new(stream(VideoConstraints::default(), None), vec![], tx);

        let err = recorder.stop().unwrap_err();
        assert!(matches!(err, RecorderError::InvalidState { action: "stop", .. }));
    }

    #[tokio::test]
    async fn missing_binary_fails_to_start() {
        let stream = FfmpegStream::new(
            "/nonexistent/ffmpeg-binary".to_string(),
            vec![],
            VideoConstraints::default(),
            ":0",
            None,
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut recorder = FfmpegMediaRecorder::new(stream, vec![], tx);

        let err = recorder.start(None).unwrap_err();
        assert!(matches!(err, RecorderError::StartFailed(ref msg) if msg.contains("not found")));
        assert_eq!(recorder.state(), RecorderState::Inactive);
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        fn shell_recorder(
            script: &str,
        ) -> (FfmpegMediaRecorder, FfmpegStream, mpsc::UnboundedReceiver<RecorderEvent>) {
            let stream = FfmpegStream::new(
                "sh".to_string(),
                vec![],
                VideoConstraints::default(),
                ":0",
                None,
            );
            let (tx, rx) = mpsc::unbounded_channel();
            let recorder = FfmpegMediaRecorder::new(
                stream.clone(),
                vec!["-c".to_string(), script.to_string()],
                tx,
            );
            (recorder, stream, rx)
        }

        async fn drain(mut rx: mpsc::UnboundedReceiver<RecorderEvent>) -> (Vec<u8>, RecorderEvent) {
            let mut data = Vec::new();
            loop {
                let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                    .await
                    .expect("recorder timed out")
                    .expect("channel closed without a final event");
                match event {
                    RecorderEvent::DataAvailable(chunk) => data.extend(chunk),
                    other => return (data, other),
                }
            }
        }

        #[tokio::test]
        async fn stop_flushes_output_then_reports_stopped() {
            let (mut recorder, stream, rx) = shell_recorder("printf abc; read -r line; printf def");

            recorder.start(None).unwrap();
            assert_eq!(recorder.state(), RecorderState::Recording);
            recorder.stop().unwrap();

            let (data, last) = drain(rx).await;
            assert_eq!(data, b"abcdef");
            assert_eq!(last, RecorderEvent::Stopped);
            assert!(!stream.is_active());
        }

        #[tokio::test]
        async fn clean_exit_without_stop_reports_stopped() {
            let (mut recorder, _stream, rx) = shell_recorder("printf abc");

            recorder.start(Some(Duration::from_millis(50))).unwrap();

            let (data, last) = drain(rx).await;
            assert_eq!(data, b"abc");
            assert_eq!(last, RecorderEvent::Stopped);
        }

        #[tokio::test]
        async fn failing_process_reports_stderr_tail() {
            let (mut recorder, _stream, rx) = shell_recorder("echo 'no such device' >&2; exit 3");

            recorder.start(None).unwrap();

            let (_, last) = drain(rx).await;
            match last {
                RecorderEvent::Errored(RecorderError::Fault(msg)) => {
                    assert!(msg.contains("no such device"), "unexpected message: {}", msg)
                }
                other => panic!("expected a fault, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn stopping_tracks_kills_the_process() {
            let (mut recorder, stream, rx) = shell_recorder("exec sleep 30");

            recorder.start(None).unwrap();
            stream.stop_all_tracks();

            let (_, last) = drain(rx).await;
            assert!(matches!(last, RecorderEvent::Errored(_)));
        }

        #[tokio::test]
        async fn ffmpeg_runs_in_its_own_process_group() {
            let (recorder, _stream, _rx) = shell_recorder("exec sleep 30");

            let mut child = recorder.spawn_ffmpeg().unwrap();
            let pid = Pid::from_raw(child.id().unwrap() as i32);
            let group = nix::unistd::getpgid(Some(pid)).unwrap();

            assert_eq!(group, pid);
            assert_ne!(group, nix::unistd::getpgrp());
            child.kill().await.unwrap();
        }

        #[tokio::test]
        async fn pause_and_resume_track_state() {
            let (mut recorder, _stream, rx) = shell_recorder("read -r line");

            recorder.start(None).unwrap();
            recorder.pause().unwrap();
            assert_eq!(recorder.state(), RecorderState::Paused);
            assert!(recorder.pause().is_err());
            recorder.resume().unwrap();
            assert_eq!(recorder.state(), RecorderState::Recording);
            recorder.stop().unwrap();

            let (_, last) = drain(rx).await;
            assert_eq!(last, RecorderEvent::Stopped);
        }
    }
}
