//! Domain layer - Core recording logic
//!
//! Contains value objects, the session state machine, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod recording;
pub mod session;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use recording::{
    format_clock, ButtonLabels, Duration, MimeType, ObjectUrl, RecordedBlob, RecordingFormat,
    RecordingOptions,
};
pub use session::{
    InvalidStateTransition, SessionErrorKind, SessionLifecycle, SessionSnapshot, SessionState,
};
