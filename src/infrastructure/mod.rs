//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with FFmpeg, the filesystem and the config directory.

pub mod capture;
pub mod config;
pub mod download;
pub mod recording;
pub mod storage;

// Re-export adapters
pub use capture::{FfmpegCaptureSource, FfmpegStream};
pub use config::XdgConfigStore;
pub use download::DirectoryDownloader;
pub use recording::{FfmpegMediaRecorder, FfmpegRecorderFactory};
pub use storage::InMemoryObjectUrls;
