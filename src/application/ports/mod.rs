//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod download;
pub mod object_url;
pub mod recorder;

// Re-export common types
pub use capture::{
    CaptureConstraints, CaptureError, CaptureSource, CaptureStream, TrackInfo, TrackKind,
    TrackState, VideoConstraints,
};
pub use config::ConfigStore;
pub use download::{DownloadError, DownloadSink};
pub use object_url::ObjectUrlStore;
pub use recorder::{
    RecorderControl, RecorderError, RecorderEvent, RecorderEvents, RecorderFactory,
    RecorderOptions, RecorderParts, RecorderState,
};
