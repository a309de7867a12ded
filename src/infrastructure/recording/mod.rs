//! Media recorder adapters

mod ffmpeg;

pub use ffmpeg::{
    FfmpegMediaRecorder, FfmpegRecorderFactory, DEFAULT_AUDIO_BITRATE, DEFAULT_VIDEO_BITRATE,
};
