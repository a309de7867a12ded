//! Screen capture adapters

mod ffmpeg;

pub use ffmpeg::{CaptureBackend, FfmpegCaptureSource, FfmpegStream};
